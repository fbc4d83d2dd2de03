//! # 管理 API 响应结构
//!
//! 统一的 JSON 出口格式。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

/// 标准成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// 无数据的成功响应
pub fn success_message(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

/// 标准错误响应
pub fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": { "message": message } })),
    )
        .into_response()
}

/// 数据库/内部错误的兜底出口
pub fn app_error(err: &crate::error::ProxyError) -> Response {
    error(err.status_code(), &err.client_message())
}
