//! # 登录/登出处理器

use axum::Form;
use axum::extract::State;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::admin::response;
use crate::admin::routes::AdminState;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

/// 登录表单
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// 登录页（极简内联表单）
pub async fn login_page() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html><head><title>ProxiBase Admin</title></head>
<body>
<form method="post" action="/login">
  <label>Username <input name="username" autocomplete="username"></label>
  <label>Password <input name="password" type="password" autocomplete="current-password"></label>
  <button type="submit">Sign in</button>
</form>
</body></html>"#,
    )
}

/// 处理登录表单：校验环境超级管理员，种会话 Cookie 后跳转 /admin
pub async fn login(State(state): State<AdminState>, Form(form): Form<LoginForm>) -> Response {
    if !state.admin_auth.verify_superadmin(&form.username, &form.password) {
        lwarn!(
            "admin",
            LogStage::Session,
            LogComponent::Admin,
            "login_failed",
            &format!("failed admin login for username '{}'", form.username)
        );
        return response::error(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let token = match state
        .admin_auth
        .create_session_token(&form.username, "superadmin")
    {
        Ok(token) => token,
        Err(err) => return response::app_error(&err),
    };

    let mut redirect = Response::builder()
        .status(StatusCode::SEE_OTHER)
        .body(axum::body::Body::empty())
        .unwrap_or_default();
    redirect
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_static("/admin"));
    if let Ok(cookie) = HeaderValue::from_str(&state.admin_auth.session_cookie(&token)) {
        redirect.headers_mut().insert(SET_COOKIE, cookie);
    }
    redirect
}

/// 登出：清 Cookie 回登录页
pub async fn logout(State(state): State<AdminState>) -> Response {
    let mut redirect = (StatusCode::SEE_OTHER, "").into_response();
    redirect
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_static("/login"));
    if let Ok(cookie) = HeaderValue::from_str(&state.admin_auth.clear_cookie()) {
        redirect.headers_mut().insert(SET_COOKIE, cookie);
    }
    redirect
}
