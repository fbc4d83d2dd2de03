//! # 应用上下文
//!
//! 持有全部共享组件，按 Arc 在请求间共享。配置与密钥启动后不再变。

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::admin::AdminAuth;
use crate::config::AppConfig;
use crate::cookies::CookieJarStore;
use crate::error::Result;
use crate::proxy::OriginClient;
use crate::ratelimit::{self, SlidingWindowLimiter};
use crate::security::SessionCodec;

/// 全局应用上下文
pub struct AppContext {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub sessions: SessionCodec,
    pub cookie_jar: CookieJarStore,
    pub origin: OriginClient,
    pub admin_auth: AdminAuth,
}

impl AppContext {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self> {
        let rate_limiter = Arc::new(SlidingWindowLimiter::new(&config.rate_limit));
        let sessions = SessionCodec::new(&config.secret_key);
        let cookie_jar = CookieJarStore::new(db.clone());
        let origin = OriginClient::new(&config.proxy)?;
        let admin_auth = AdminAuth::new(
            &config.secret_key,
            config.admin.username.clone(),
            config.admin.password.clone(),
        );

        Ok(Self {
            config,
            db,
            rate_limiter,
            sessions,
            cookie_jar,
            origin,
            admin_auth,
        })
    }

    /// 启动后台任务（限流器空闲键清理）
    pub fn spawn_background_tasks(&self) -> tokio::task::JoinHandle<()> {
        ratelimit::log_limiter_config(&self.config.rate_limit);
        ratelimit::spawn_eviction_task(Arc::clone(&self.rate_limiter))
    }
}
