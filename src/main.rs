//! # ProxiBase
//!
//! 镜像反向代理服务入口：初始化日志与配置，连接数据库并跑迁移，
//! 然后在单个监听端口上服务健康检查、管理后台与代理引擎。

use std::sync::Arc;

use proxibase::error::ErrorContext;
use proxibase::logging::{LogComponent, LogStage};
use proxibase::{linfo, AppConfig};

#[tokio::main]
async fn main() -> proxibase::Result<()> {
    proxibase::logging::init_logging();

    // 加载并校验配置
    let config = AppConfig::from_env();
    if let Err(reason) = config.validate() {
        return Err(proxibase::ProxyError::config(format!(
            "配置无效: {reason}"
        )));
    }

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "config_loaded",
        &format!(
            "配置加载成功: listen {}:{}, admin host {}",
            config.server.host, config.server.port, config.admin.host
        )
    );

    // 初始化数据库并运行迁移
    let db = proxibase::database::init_database(&config.database.url)
        .await
        .with_database_context(|| "数据库连接失败".to_string())?;

    proxibase::database::run_migrations(&db)
        .await
        .with_database_context(|| "数据库迁移失败".to_string())?;

    if let Err(e) = proxibase::database::check_database_status(&db).await {
        tracing::warn!("数据库状态检查失败: {e}");
    }

    // 装配应用上下文并启动后台任务
    let context = Arc::new(proxibase::app::AppContext::new(config, db)?);
    let background = context.spawn_background_tasks();

    // 服务主循环
    let serve_result = tokio::select! {
        result = proxibase::proxy::serve(Arc::clone(&context)) => result,
        _ = tokio::signal::ctrl_c() => {
            linfo!(
                "system",
                LogStage::Shutdown,
                LogComponent::Main,
                "shutdown",
                "收到中断信号，正在退出"
            );
            Ok(())
        }
    };

    background.abort();
    serve_result
}
