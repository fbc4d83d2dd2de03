//! # 概览与兜底处理器

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::admin::response;
use crate::admin::routes::AdminState;

/// 管理面板概览：站点数量统计
pub async fn overview(State(state): State<AdminState>) -> Response {
    let total = entity::Sites::find().count(&state.db).await;
    let enabled = entity::Sites::find()
        .filter(entity::sites::Column::Enabled.eq(true))
        .count(&state.db)
        .await;

    match (total, enabled) {
        (Ok(total), Ok(enabled)) => response::success(serde_json::json!({
            "sites_count": total,
            "active_sites_count": enabled,
        })),
        (Err(err), _) | (_, Err(err)) => response::app_error(&err.into()),
    }
}

/// 管理域名下未知路径
pub async fn not_found() -> Response {
    response::error(StatusCode::NOT_FOUND, "not found")
}
