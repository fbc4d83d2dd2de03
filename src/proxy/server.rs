//! # HTTP 监听与按 Host 分流
//!
//! 单监听端口上的三路分发：`/health` 直接应答；Host 命中管理后台域名
//! 走 admin 路由；其余全部进代理引擎。

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::HOST;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::app::AppContext;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::sites::normalize_host;
use crate::{linfo, lwarn};

use super::engine;

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
    admin_router: Router,
}

impl AppState {
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        let admin_router = crate::admin::admin_router(context.clone());
        Self {
            context,
            admin_router,
        }
    }

    #[must_use]
    pub const fn context_arc(&self) -> &Arc<AppContext> {
        &self.context
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 组装完整路由
#[must_use]
pub fn build_router(context: Arc<AppContext>) -> Router {
    let state = AppState::new(context);

    Router::new()
        .route("/health", get(health_handler))
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 任何 Host 下 `/health` 都应答 ok
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 按 Host 分流：管理后台域名走 admin 路由，其余进代理引擎
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    req: Request,
) -> Response {
    let host = req
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(normalize_host)
        .unwrap_or_default();

    if host == normalize_host(&state.config.admin.host) {
        match state.admin_router.clone().oneshot(req).await {
            Ok(response) => response.into_response(),
            Err(infallible) => match infallible {},
        }
    } else {
        engine::handle_proxy_request(state.context_arc().clone(), req, client_addr).await
    }
}

/// 绑定端口并开始服务
pub async fn serve(context: Arc<AppContext>) -> Result<()> {
    let host = context.config.server.host.clone();
    let ip = host.parse::<std::net::IpAddr>().map_err(|e| {
        crate::error::ProxyError::config(format!("Invalid bind address '{host}': {e}"))
    })?;
    let addr = SocketAddr::new(ip, context.config.server.port);

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::ServerSetup,
        "server_start",
        &format!("Starting proxy server on {addr}")
    );

    let router = build_router(context);
    let listener = TcpListener::bind(&addr).await?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_exit",
            &format!("server loop exited: {e}")
        );
        crate::error::ProxyError::internal_with_source("server error", e.into())
    })
}
