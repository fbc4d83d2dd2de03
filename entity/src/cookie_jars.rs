//! # Cookie 罐实体定义
//!
//! 按 (site_id, session_id, origin_host) 三元组存储某个用户会话在某个
//! 源站主机下的全部 Cookie，`cookie_data` 为 name→value 的 JSON 文本。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cookie 罐条目实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cookie_jars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub site_id: i32,
    pub session_id: String,
    /// 实际访问的源站主机，而非站点根域名
    pub origin_host: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub cookie_data: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sites::Entity",
        from = "Column::SiteId",
        to = "super::sites::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Site,
}

impl Related<super::sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
