//! # 配置模块
//!
//! 从环境变量加载应用配置

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, DatabaseConfig, ProxyConfig, RateLimitConfig, ServerConfig,
};
