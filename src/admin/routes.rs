//! # 管理路由配置

use std::ops::Deref;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::app::AppContext;

use super::handlers;

/// 管理路由的应用状态
#[derive(Clone)]
pub struct AdminState {
    context: Arc<AppContext>,
}

impl AdminState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AdminState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 创建管理路由
///
/// `/login`、`/logout` 公开；`/admin/*` 全部要求有效会话。
#[must_use]
pub fn admin_router(context: Arc<AppContext>) -> Router {
    let state = AdminState::new(context);

    let public_routes = Router::new()
        .route(
            "/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route("/logout", get(handlers::auth::logout));

    let protected_routes = Router::new()
        .route("/admin", get(handlers::system::overview))
        .route(
            "/admin/sites",
            get(handlers::sites::list_sites).post(handlers::sites::create_site),
        )
        .route(
            "/admin/sites/{id}",
            axum::routing::put(handlers::sites::update_site).delete(handlers::sites::delete_site),
        )
        .route(
            "/admin/config",
            get(handlers::config::get_config).put(handlers::config::update_config),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            super::middleware::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(handlers::system::not_found)
        .with_state(state)
}
