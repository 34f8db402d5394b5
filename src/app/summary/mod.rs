//! 营收汇总

pub mod handler;
pub mod model;
pub mod service;
