//! # 错误类型定义

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// 应用主要错误类型
///
/// 变体划分对应代理请求路径上的各类失败面：配置/数据库/内部错误属于
/// 服务器自身问题，其余变体与发往客户端的状态码一一对应。
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 配置相关错误
    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 网络通信错误（DNS、连接、读取失败）
    #[error("origin fetch failed: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 源站请求超出总预算
    #[error("origin request timed out after {timeout_secs}s")]
    OriginTimeout { timeout_secs: u64 },

    /// SSRF 防护拒绝了源站 URL
    #[error("unsafe origin url: {reason}")]
    UnsafeOrigin { reason: String },

    /// 速率限制拒绝
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// 没有匹配的镜像站点
    #[error("no site configured for host: {host}")]
    SiteNotFound { host: String },

    /// 非媒体响应超出大小上限
    #[error("response too large: {size} bytes exceeds {limit} byte limit")]
    OversizeResponse { size: usize, limit: usize },

    /// 源站响应体无法解码
    #[error("malformed origin response: {message}")]
    MalformedResponse { message: String },

    /// 认证和授权错误
    #[error("authentication error: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("io error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 系统内部错误
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ProxyError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    pub fn database_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn unsafe_origin(reason: impl Into<String>) -> Self {
        Self::UnsafeOrigin {
            reason: reason.into(),
        }
    }

    /// 映射到发给客户端的 HTTP 状态码
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::SiteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::OversizeResponse { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsafeOrigin { .. }
            | Self::OriginTimeout { .. }
            | Self::Network { .. }
            | Self::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::Config { .. }
            | Self::Database { .. }
            | Self::Serialization { .. }
            | Self::Io { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 客户端可见的简短原因。源站侧失败不暴露内部细节。
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::SiteNotFound { .. } => String::new(),
            Self::UnsafeOrigin { reason } => format!("Blocked: {reason}"),
            Self::RateLimited { retry_after_secs } => {
                format!("Rate limit exceeded. Try again in {retry_after_secs} seconds.")
            }
            Self::OriginTimeout { .. } => "Origin request timed out".to_string(),
            Self::Network { .. } => "Error fetching origin".to_string(),
            Self::OversizeResponse { size, limit } => format!(
                "Response too large: {:.1}MB exceeds {}MB limit",
                *size as f64 / (1024.0 * 1024.0),
                limit / (1024 * 1024)
            ),
            Self::MalformedResponse { .. } => "Malformed origin response".to_string(),
            Self::Auth { message, .. } => message.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.client_message()).into_response()
    }
}

impl From<sea_orm::DbErr> for ProxyError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::database_with_source("database operation failed", err.into())
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        assert_eq!(
            ProxyError::SiteNotFound {
                host: "x".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ProxyError::unsafe_origin("loopback").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ProxyError::RateLimited {
                retry_after_secs: 3
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ProxyError::OversizeResponse {
                size: 1,
                limit: 1
            }
            .status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ProxyError::OriginTimeout { timeout_secs: 15 }.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn client_message_hides_internal_detail() {
        let err = ProxyError::network_with_source(
            "connect refused 10.0.0.1:443",
            anyhow::anyhow!("raw backtrace"),
        );
        assert_eq!(err.client_message(), "Error fetching origin");
    }
}
