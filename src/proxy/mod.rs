//! # 代理模块
//!
//! 监听、分流与每请求的代理引擎

pub mod engine;
pub mod headers;
pub mod server;
pub mod upstream;

pub use server::{AppState, build_router, serve};
pub use upstream::OriginClient;
