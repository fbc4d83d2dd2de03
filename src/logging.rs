//! # 统一日志工具模块
//!
//! 提供代理的日志工具链：
//! - 标准化的业务日志宏（阶段/组件/操作三元组）
//! - 每个代理请求一条的结构化访问记录
//! - 日志系统初始化和过滤配置

use std::env;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志阶段枚举
#[derive(Debug, Clone, Copy)]
pub enum LogStage {
    RequestStart,
    SiteResolve,
    RateLimit,
    Session,
    UpstreamRequest,
    Response,
    Rewrite,
    Error,
    Startup,
    Shutdown,
    BackgroundTask,
    Db,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestStart => "request_start",
            Self::SiteResolve => "site_resolve",
            Self::RateLimit => "rate_limit",
            Self::Session => "session",
            Self::UpstreamRequest => "upstream_request",
            Self::Response => "response",
            Self::Rewrite => "rewrite",
            Self::Error => "error",
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::BackgroundTask => "background_task",
            Self::Db => "db",
        }
    }
}

/// 组件枚举
#[derive(Debug, Clone, Copy)]
pub enum LogComponent {
    Main,
    ServerSetup,
    Config,
    Database,
    Engine,
    Resolver,
    RateLimiter,
    SessionCodec,
    CookieJar,
    Rewriter,
    AdFilter,
    Upstream,
    Admin,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::Database => "database",
            Self::Engine => "engine",
            Self::Resolver => "resolver",
            Self::RateLimiter => "rate_limiter",
            Self::SessionCodec => "session_codec",
            Self::CookieJar => "cookie_jar",
            Self::Rewriter => "rewriter",
            Self::AdFilter => "ad_filter",
            Self::Upstream => "upstream",
            Self::Admin => "admin",
        }
    }
}

/// 标准日志宏 - 信息级别
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::info!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::info!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 标准日志宏 - 调试级别
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::debug!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::debug!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 标准日志宏 - 警告级别
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::warn!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::warn!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 标准日志宏 - 错误级别
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr, $($rest:tt)*) => {
        tracing::error!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
            $($rest)*
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr) => {
        tracing::error!(
            request_id = %$request_id,
            stage = $stage.as_str(),
            operation = $operation,
            component = $component.as_str(),
            message = %$description,
        )
    };
}

/// 每个完成的代理请求记录一条访问日志
///
/// 级别规则：2xx/3xx 记 INFO，4xx 与安全性拒绝（限流、SSRF）记 WARN，
/// 其余 5xx 与超时记 ERROR。
pub struct ProxyRequestLog<'a> {
    pub request_id: &'a str,
    pub client_ip: &'a str,
    pub mirror_host: &'a str,
    pub origin_url: &'a str,
    pub status_code: u16,
    pub latency_ms: u64,
    pub user_agent: &'a str,
    /// SSRF 拦截这类拒绝即使以 5xx 回应也按 WARN 记
    pub security_denial: bool,
}

pub fn log_proxy_request(entry: &ProxyRequestLog<'_>) {
    let status_class = if entry.security_denial && entry.status_code >= 500 {
        400
    } else {
        entry.status_code
    };
    match status_class {
        200..=399 => linfo!(
            entry.request_id,
            LogStage::Response,
            LogComponent::Engine,
            "proxy_request",
            "proxy request completed",
            client_ip = %entry.client_ip,
            mirror_host = %entry.mirror_host,
            origin_url = %entry.origin_url,
            status_code = entry.status_code,
            latency_ms = entry.latency_ms,
            user_agent = %entry.user_agent
        ),
        400..=499 => lwarn!(
            entry.request_id,
            LogStage::Response,
            LogComponent::Engine,
            "proxy_request",
            "proxy request rejected",
            client_ip = %entry.client_ip,
            mirror_host = %entry.mirror_host,
            origin_url = %entry.origin_url,
            status_code = entry.status_code,
            latency_ms = entry.latency_ms,
            user_agent = %entry.user_agent
        ),
        _ => lerror!(
            entry.request_id,
            LogStage::Response,
            LogComponent::Engine,
            "proxy_request",
            "proxy request failed",
            client_ip = %entry.client_ip,
            mirror_host = %entry.mirror_host,
            origin_url = %entry.origin_url,
            status_code = entry.status_code,
            latency_ms = entry.latency_ms,
            user_agent = %entry.user_agent
        ),
    }
}

/// 初始化日志系统
///
/// `LOG_FORMAT=json` 输出结构化 JSON（生产默认），其余值输出人类可读格式。
/// `RUST_LOG` 覆盖默认过滤器。
pub fn init_logging() {
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info,proxibase=info".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::try_new(&log_filter).unwrap_or_default());

    let noise_filter = tracing_subscriber::filter::FilterFn::new(|metadata| {
        !metadata.target().starts_with("hyper::")
            && !metadata.target().starts_with("h2::")
            && !metadata.target().starts_with("tokio::runtime")
            && !metadata.target().starts_with("sqlx::query")
    });

    let json_output = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(true);

    if json_output {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(false)
            .with_filter(noise_filter);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(noise_filter);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}
