//! # 管理员用户实体定义
//!
//! 数据库存储的管理员账号。环境变量中的超级管理员不落库。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 管理员用户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    /// "admin" | "viewer"
    pub role: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
