//! 日志基础设施

use std::io;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// 初始化日志系统
    ///
    /// - 控制台输出始终开启
    /// - 配置了 `log_dir` 时额外写入按日期分割的日志文件
    /// - `RUST_LOG` 环境变量优先于配置中的级别
    ///
    /// 返回的 guard 需要在程序退出前一直持有，否则文件日志会丢失。
    pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))?;

        match &config.log_dir {
            Some(log_dir) => {
                std::fs::create_dir_all(log_dir)?;

                let file_appender = rolling::daily(log_dir, &config.file_prefix);
                let (writer, guard) = non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false) // 文件中不使用颜色
                            .with_target(false),
                    )
                    .with(fmt::layer().with_writer(io::stdout).with_ansi(true))
                    .try_init()?;

                Ok(Some(guard))
            }
            None => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_writer(io::stdout).with_ansi(true))
                    .try_init()?;

                Ok(None)
            }
        }
    }
}
