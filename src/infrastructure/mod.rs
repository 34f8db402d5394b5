//! 基础设施层：日志与持久化

pub mod logger;
pub mod storage;
