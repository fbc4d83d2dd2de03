//! # 镜像站点实体定义
//!
//! 站点表的 Sea-ORM 实体模型。每条记录把一个镜像根域名映射到一个源站根域名，
//! 可选字段为空时回退到全局配置。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 镜像站点实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 镜像根域名（唯一，小写）
    #[sea_orm(unique)]
    pub mirror_root: String,
    /// 源站根域名
    pub source_root: String,
    pub enabled: bool,
    // 站点级覆盖项，None 表示继承全局配置
    pub proxy_subdomains: Option<bool>,
    pub proxy_external_domains: Option<bool>,
    pub rewrite_js_redirects: Option<bool>,
    pub remove_ads: Option<bool>,
    pub inject_ads: Option<bool>,
    pub remove_analytics: Option<bool>,
    /// "bypass" | "proxy" | "size_limited"
    pub media_policy: Option<String>,
    /// "stateless" | "cookie_jar"
    pub session_mode: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_ad_html: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_tracker_js: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cookie_jars::Entity")]
    CookieJars,
}

impl Related<super::cookie_jars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CookieJars.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
