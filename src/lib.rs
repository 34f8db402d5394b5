//! # revenue-board
//!
//! 产品录入与分类营收统计：
//! - 产品列表的增删改，分类只增不减
//! - 按分类汇总营收并计算占比
//! - 每次修改后把完整快照写入键值存储，启动时恢复

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use app::categories::model::{CategorySet, DEFAULT_CATEGORIES};
pub use app::products::model::{coerce_number, Product, ProductId, ProductPatch};
pub use app::products::service::{ProductStore, Snapshot, StorageKeys};
pub use app::summary::model::{CategoryShare, Summary, SummaryView};
pub use app::summary::service::aggregate;
pub use config::{Config, ConfigError};
pub use infrastructure::storage::{FileStore, KeyValueStore, MemoryStore, Outcome, StorageError};
