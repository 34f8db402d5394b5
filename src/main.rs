use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use revenue_board::app::{self, AppState, DynStore};
use revenue_board::config::load_config;
use revenue_board::infrastructure::logger::Logger;
use revenue_board::{FileStore, ProductStore, Snapshot, StorageKeys};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 可选参数：配置文件路径
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref()).context("加载配置失败")?;
    config.validate().context("配置无效")?;

    let _log_guard = Logger::init(&config.logging).context("初始化日志失败")?;
    info!("启动 revenue-board 服务...");

    let file_store = FileStore::open(&config.storage.data_dir)
        .with_context(|| format!("无法打开数据目录 {}", config.storage.data_dir.display()))?
        .with_quota(config.storage.quota_bytes);
    info!("数据目录: {}", file_store.dir().display());

    let first_run = if config.storage.seed_sample_data {
        Snapshot::sample()
    } else {
        Snapshot::initial()
    };
    let opened = ProductStore::open(
        Box::new(file_store) as DynStore,
        StorageKeys::from(&config.storage),
        first_run,
    );
    if let Some(e) = &opened.storage_error {
        warn!("部分数据无法读取，已使用默认数据: {}", e);
    }

    let app = app::router(AppState::new(opened.value));

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法绑定到 {}", addr))?;

    info!("🚀 服务运行在 http://{}", addr);
    axum::serve(listener, app).await.context("服务异常退出")?;

    Ok(())
}
