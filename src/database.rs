//! # 数据库模块
//!
//! 站点/全局配置库的连接、迁移与启动状态汇报

use std::path::Path;

use migration::MigratorTrait;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{debug, info, warn};

/// 初始化配置数据库连接
///
/// SQLite URL 会先确保数据库文件与父目录存在，Postgres 直连。
pub async fn init_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    info!("正在连接站点配置库: {}", sanitize_url(database_url));

    if database_url.starts_with("sqlite:") {
        ensure_sqlite_file(database_url)?;
    }

    let db = Database::connect(database_url).await?;

    info!("站点配置库连接就绪");
    Ok(db)
}

/// 运行数据库迁移
///
/// 建出 sites / global_config / cookie_jars / admin_users 四张表，
/// 并种入全局配置单行。
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("正在应用数据库迁移...");
    ::migration::Migrator::up(db, None).await?;
    info!("数据库迁移已全部应用");
    Ok(())
}

/// 启动时汇报数据库状态：待应用迁移数与镜像站点概况
pub async fn check_database_status(db: &DatabaseConnection) -> Result<(), DbErr> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;
    if !pending.is_empty() {
        warn!("迁移状态: {} 个待应用", pending.len());
    }

    let total = entity::Sites::find().count(db).await?;
    let enabled = entity::Sites::find()
        .filter(entity::sites::Column::Enabled.eq(true))
        .count(db)
        .await?;
    if total == 0 {
        warn!("尚未配置任何镜像站点，所有代理请求都会得到 404");
    } else {
        info!("镜像站点配置: 共 {total} 个, 启用 {enabled} 个");
    }

    Ok(())
}

/// SQLite 数据库文件与父目录不存在时先建出来
fn ensure_sqlite_file(database_url: &str) -> Result<(), DbErr> {
    let db_path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if db_path == ":memory:" || db_path.starts_with(":memory:") {
        return Ok(());
    }

    let db_file_path = Path::new(db_path);
    if let Some(parent_dir) = db_file_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            debug!("创建数据库目录: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).map_err(|e| {
                DbErr::Custom(format!(
                    "无法创建数据库目录 {}: {}",
                    parent_dir.display(),
                    e
                ))
            })?;
        }
    }

    if !db_file_path.exists() {
        debug!("创建数据库文件: {}", db_file_path.display());
        std::fs::File::create(db_file_path).map_err(|e| {
            DbErr::Custom(format!(
                "无法创建数据库文件 {}: {}",
                db_file_path.display(),
                e
            ))
        })?;
    }

    Ok(())
}

/// 日志里隐藏连接串中的凭据部分
fn sanitize_url(database_url: &str) -> &str {
    if database_url.starts_with("sqlite:") {
        database_url
    } else {
        database_url
            .split('@')
            .next_back()
            .unwrap_or(database_url)
    }
}
