//! # 全局配置处理器

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;

use crate::admin::response;
use crate::admin::routes::AdminState;

/// 全局配置更新请求：缺省字段保持不变
#[derive(Debug, Deserialize)]
pub struct UpdateConfigPayload {
    pub proxy_subdomains: Option<bool>,
    pub proxy_external_domains: Option<bool>,
    pub rewrite_js_redirects: Option<bool>,
    pub remove_ads: Option<bool>,
    pub inject_ads: Option<bool>,
    pub remove_analytics: Option<bool>,
    pub media_policy: Option<String>,
    pub session_mode: Option<String>,
    pub custom_ad_html: Option<String>,
    pub custom_tracker_js: Option<String>,
}

/// 读取全局配置
pub async fn get_config(State(state): State<AdminState>) -> Response {
    match entity::GlobalConfig::find_by_id(1).one(&state.db).await {
        Ok(Some(config)) => response::success(serde_json::json!({ "config": config })),
        Ok(None) => response::error(StatusCode::NOT_FOUND, "global config row missing"),
        Err(err) => response::app_error(&err.into()),
    }
}

/// 更新全局配置（单行 id=1）
pub async fn update_config(
    State(state): State<AdminState>,
    Json(payload): Json<UpdateConfigPayload>,
) -> Response {
    if let Some(policy) = &payload.media_policy {
        if crate::sites::MediaPolicy::parse(policy).is_none() {
            return response::error(
                StatusCode::BAD_REQUEST,
                "media_policy must be one of bypass/proxy/size_limited",
            );
        }
    }
    if let Some(mode) = &payload.session_mode {
        if crate::sites::SessionMode::parse(mode).is_none() {
            return response::error(
                StatusCode::BAD_REQUEST,
                "session_mode must be one of stateless/cookie_jar",
            );
        }
    }

    let existing = match entity::GlobalConfig::find_by_id(1).one(&state.db).await {
        Ok(Some(config)) => config,
        Ok(None) => return response::error(StatusCode::NOT_FOUND, "global config row missing"),
        Err(err) => return response::app_error(&err.into()),
    };

    let mut active: entity::global_config::ActiveModel = existing.into();
    if let Some(v) = payload.proxy_subdomains {
        active.proxy_subdomains = Set(v);
    }
    if let Some(v) = payload.proxy_external_domains {
        active.proxy_external_domains = Set(v);
    }
    if let Some(v) = payload.rewrite_js_redirects {
        active.rewrite_js_redirects = Set(v);
    }
    if let Some(v) = payload.remove_ads {
        active.remove_ads = Set(v);
    }
    if let Some(v) = payload.inject_ads {
        active.inject_ads = Set(v);
    }
    if let Some(v) = payload.remove_analytics {
        active.remove_analytics = Set(v);
    }
    if let Some(v) = payload.media_policy {
        active.media_policy = Set(v);
    }
    if let Some(v) = payload.session_mode {
        active.session_mode = Set(v);
    }
    if let Some(v) = payload.custom_ad_html {
        active.custom_ad_html = Set(Some(v));
    }
    if let Some(v) = payload.custom_tracker_js {
        active.custom_tracker_js = Set(Some(v));
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&state.db).await {
        Ok(config) => response::success(serde_json::json!({ "config": config })),
        Err(err) => response::app_error(&err.into()),
    }
}
