//! # 应用配置结构定义

use std::env;

use serde::{Deserialize, Serialize};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 管理后台配置
    pub admin: AdminConfig,
    /// 会话签名密钥
    pub secret_key: String,
    /// 速率限制配置
    pub rate_limit: RateLimitConfig,
    /// 代理转发配置
    pub proxy: ProxyConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP监听地址
    pub host: String,
    /// HTTP监听端口
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接URL（SQLite 或 Postgres）
    pub url: String,
}

/// 管理后台配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// 管理后台域名，按 Host 头分流
    pub host: String,
    /// 环境超级管理员用户名
    pub username: String,
    /// 环境超级管理员密码
    pub password: String,
}

/// 速率限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// 窗口内最大请求数
    pub max_requests: u32,
    /// 滑动窗口大小（秒）
    pub window_secs: u64,
    /// 是否信任 X-Forwarded-For 的第一跳作为客户端 IP
    pub trust_forwarded_for: bool,
}

/// 代理转发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// 非媒体响应的大小上限（MB）
    pub max_response_size_mb: usize,
    /// 单次源站请求总超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./proxibase.db".to_string(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: "admin.localhost".to_string(),
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 60,
            window_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_response_size_mb: 15,
            request_timeout_secs: 15,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            admin: AdminConfig::default(),
            secret_key: String::new(),
            rate_limit: RateLimitConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置，缺省值与文档一致
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_string("HOST", "0.0.0.0"),
                port: env_or("PORT", 8080),
            },
            database: DatabaseConfig {
                url: env_string("DATABASE_URL", "sqlite://./proxibase.db"),
            },
            admin: AdminConfig {
                host: env_string("ADMIN_HOST", "admin.localhost"),
                username: env_string("ADMIN_USERNAME", "admin"),
                password: env_string("ADMIN_PASSWORD", "admin123"),
            },
            secret_key: env_string("SECRET_KEY", ""),
            rate_limit: RateLimitConfig {
                enabled: env_or("ENABLE_RATE_LIMITING", true),
                max_requests: env_or("RATE_LIMIT_REQUESTS", 60),
                window_secs: env_or("RATE_LIMIT_WINDOW", 60),
                trust_forwarded_for: env_or("TRUST_FORWARDED_FOR", false),
            },
            proxy: ProxyConfig {
                max_response_size_mb: env_or("MAX_RESPONSE_SIZE_MB", 15),
                request_timeout_secs: env_or("REQUEST_TIMEOUT", 15),
            },
        }
    }

    /// 非媒体响应大小上限（字节）
    #[must_use]
    pub const fn max_response_bytes(&self) -> usize {
        self.proxy.max_response_size_mb * 1024 * 1024
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err(format!("Invalid server port: {}", self.server.port));
        }
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.secret_key.is_empty() {
            return Err("SECRET_KEY must be set".to_string());
        }
        if self.rate_limit.enabled && self.rate_limit.max_requests == 0 {
            return Err("RATE_LIMIT_REQUESTS must be greater than 0".to_string());
        }
        if self.rate_limit.enabled && self.rate_limit.window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW must be greater than 0".to_string());
        }
        if self.proxy.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT must be greater than 0".to_string());
        }
        Ok(())
    }
}
