//! 核心层：错误处理、响应结构、中间件、确认能力

pub mod confirm;
pub mod error;
pub mod middleware;
pub mod response;
