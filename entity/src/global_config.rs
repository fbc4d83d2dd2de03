//! # 全局配置实体定义
//!
//! 单行表（id=1），为所有站点提供默认配置值。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 全局配置实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "global_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub proxy_subdomains: bool,
    pub proxy_external_domains: bool,
    pub rewrite_js_redirects: bool,
    pub remove_ads: bool,
    pub inject_ads: bool,
    pub remove_analytics: bool,
    /// "bypass" | "proxy" | "size_limited"
    pub media_policy: String,
    /// "stateless" | "cookie_jar"
    pub session_mode: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_ad_html: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_tracker_js: Option<String>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
