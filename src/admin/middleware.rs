//! # 管理后台认证中间件
//!
//! 从 Cookie 中取会话令牌，校验后把管理员信息注入请求扩展。

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;

use super::auth::ADMIN_SESSION_COOKIE;
use super::routes::AdminState;
use crate::cookies::parse_cookie_header;

/// 已认证的管理员上下文
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub username: String,
    pub role: String,
}

/// Axum 认证中间件
pub async fn auth(
    State(state): State<AdminState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(parse_cookie_header)
        .and_then(|cookies| cookies.get(ADMIN_SESSION_COOKIE).cloned());

    let Some(token) = token else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.admin_auth.verify_session_token(&token) {
        Some(claims) => {
            request.extensions_mut().insert(Arc::new(AdminContext {
                username: claims.sub,
                role: claims.role,
            }));
            Ok(next.run(request).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
