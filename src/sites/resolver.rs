//! # 站点解析
//!
//! 把请求的 Host 头解析到一个启用的镜像站点。

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::Result;

/// 主机名规范化：小写并去掉端口
#[must_use]
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    match host.split_once(':') {
        Some((name, _port)) => name.to_string(),
        None => host,
    }
}

/// 按 Host 查找启用的站点
///
/// 先精确匹配 `mirror_root`，再找最长的 `mirror_root` 后缀满足
/// host == `<prefix>.<mirror_root>`；都不中返回 None（上层回 404）。
pub async fn find_site_by_host(
    db: &DatabaseConnection,
    host: &str,
) -> Result<Option<entity::sites::Model>> {
    let host = normalize_host(host);

    let sites = entity::Sites::find()
        .filter(entity::sites::Column::Enabled.eq(true))
        .all(db)
        .await?;

    if let Some(site) = sites
        .iter()
        .find(|s| s.mirror_root.eq_ignore_ascii_case(&host))
    {
        return Ok(Some(site.clone()));
    }

    let best = sites
        .into_iter()
        .filter(|s| {
            let suffix = format!(".{}", s.mirror_root.to_ascii_lowercase());
            host.ends_with(&suffix)
        })
        .max_by_key(|s| s.mirror_root.len());

    Ok(best)
}

/// 读取全局配置单行（id=1）
pub async fn load_global_config(
    db: &DatabaseConnection,
) -> Result<Option<entity::global_config::Model>> {
    Ok(entity::GlobalConfig::find_by_id(1).one(db).await?)
}
