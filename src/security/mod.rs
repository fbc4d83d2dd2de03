//! # 安全模块
//!
//! SSRF 防护与会话签名

mod session;
mod ssrf;

pub use session::{SESSION_COOKIE_NAME, SESSION_MAX_AGE_SECS, SessionCodec};
pub use ssrf::is_safe_origin_url;
