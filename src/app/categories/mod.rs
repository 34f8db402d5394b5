//! 分类管理

pub mod handler;
pub mod model;
