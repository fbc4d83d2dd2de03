//! # 站点 CRUD 处理器

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;

use crate::admin::response;
use crate::admin::routes::AdminState;
use crate::sites::normalize_host;

/// 创建/更新共用的站点字段
#[derive(Debug, Deserialize)]
pub struct SitePayload {
    pub mirror_root: String,
    pub source_root: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
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

const fn default_enabled() -> bool {
    true
}

fn validate_payload(payload: &SitePayload) -> Option<&'static str> {
    if payload.mirror_root.trim().is_empty() {
        return Some("mirror_root is required");
    }
    if payload.source_root.trim().is_empty() {
        return Some("source_root is required");
    }
    if let Some(policy) = &payload.media_policy {
        if crate::sites::MediaPolicy::parse(policy).is_none() {
            return Some("media_policy must be one of bypass/proxy/size_limited");
        }
    }
    if let Some(mode) = &payload.session_mode {
        if crate::sites::SessionMode::parse(mode).is_none() {
            return Some("session_mode must be one of stateless/cookie_jar");
        }
    }
    None
}

fn apply_payload(active: &mut entity::sites::ActiveModel, payload: SitePayload) {
    active.mirror_root = Set(normalize_host(&payload.mirror_root));
    active.source_root = Set(normalize_host(&payload.source_root));
    active.enabled = Set(payload.enabled);
    active.proxy_subdomains = Set(payload.proxy_subdomains);
    active.proxy_external_domains = Set(payload.proxy_external_domains);
    active.rewrite_js_redirects = Set(payload.rewrite_js_redirects);
    active.remove_ads = Set(payload.remove_ads);
    active.inject_ads = Set(payload.inject_ads);
    active.remove_analytics = Set(payload.remove_analytics);
    active.media_policy = Set(payload.media_policy);
    active.session_mode = Set(payload.session_mode);
    active.custom_ad_html = Set(payload.custom_ad_html);
    active.custom_tracker_js = Set(payload.custom_tracker_js);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
}

/// 列出全部站点
pub async fn list_sites(State(state): State<AdminState>) -> Response {
    match entity::Sites::find().all(&state.db).await {
        Ok(sites) => response::success(serde_json::json!({ "sites": sites })),
        Err(err) => response::app_error(&err.into()),
    }
}

/// 创建站点
pub async fn create_site(
    State(state): State<AdminState>,
    Json(payload): Json<SitePayload>,
) -> Response {
    if let Some(reason) = validate_payload(&payload) {
        return response::error(StatusCode::BAD_REQUEST, reason);
    }

    let mut active = entity::sites::ActiveModel {
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    apply_payload(&mut active, payload);

    match active.insert(&state.db).await {
        Ok(site) => response::success(serde_json::json!({ "site": site })),
        Err(err) => response::app_error(&err.into()),
    }
}

/// 更新站点
pub async fn update_site(
    State(state): State<AdminState>,
    Path(id): Path<i32>,
    Json(payload): Json<SitePayload>,
) -> Response {
    if let Some(reason) = validate_payload(&payload) {
        return response::error(StatusCode::BAD_REQUEST, reason);
    }

    let existing = match entity::Sites::find_by_id(id).one(&state.db).await {
        Ok(Some(site)) => site,
        Ok(None) => return response::error(StatusCode::NOT_FOUND, "site not found"),
        Err(err) => return response::app_error(&err.into()),
    };

    let mut active: entity::sites::ActiveModel = existing.into();
    apply_payload(&mut active, payload);

    match active.update(&state.db).await {
        Ok(site) => response::success(serde_json::json!({ "site": site })),
        Err(err) => response::app_error(&err.into()),
    }
}

/// 删除站点（级联清掉它的 Cookie 罐）
pub async fn delete_site(State(state): State<AdminState>, Path(id): Path<i32>) -> Response {
    match entity::Sites::delete_by_id(id).exec(&state.db).await {
        Ok(result) if result.rows_affected > 0 => response::success_message("site deleted"),
        Ok(_) => response::error(StatusCode::NOT_FOUND, "site not found"),
        Err(err) => response::app_error(&err.into()),
    }
}
