//! # Cookie 罐存取
//!
//! 每个 (site_id, session_id, origin_host) 三元组一行，`cookie_data`
//! 存 name→value 的 JSON。属性（Path/Domain/Expires 等）不做语义处理，
//! 只取首段的 name=value。

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::error::Result;

/// 解析请求的 Cookie 头为 name→value 映射
#[must_use]
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let pair = pair.trim();
        if let Some((name, value)) = pair.split_once('=') {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    cookies
}

/// 从一条 Set-Cookie 头里取出 name 和 value
///
/// 只看第一个分号前的 name=value，其余属性丢弃。
#[must_use]
pub fn parse_set_cookie_line(line: &str) -> Option<(String, String)> {
    let first = line.split(';').next()?.trim();
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// 把 Cookie 映射渲染成请求头值，按名称排序保证稳定输出
#[must_use]
pub fn render_cookie_header(cookies: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = cookies.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Cookie 罐存储
#[derive(Clone)]
pub struct CookieJarStore {
    db: DatabaseConnection,
}

impl CookieJarStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 读取某个三元组下保存的全部 Cookie，缺失时返回空映射
    pub async fn get(
        &self,
        site_id: i32,
        session_id: &str,
        origin_host: &str,
    ) -> Result<HashMap<String, String>> {
        let row = entity::CookieJars::find()
            .filter(entity::cookie_jars::Column::SiteId.eq(site_id))
            .filter(entity::cookie_jars::Column::SessionId.eq(session_id))
            .filter(entity::cookie_jars::Column::OriginHost.eq(origin_host))
            .one(&self.db)
            .await?;

        let Some(row) = row else {
            return Ok(HashMap::new());
        };
        let Some(data) = row.cookie_data else {
            return Ok(HashMap::new());
        };

        // 历史坏数据不致命，按空罐处理
        Ok(serde_json::from_str(&data).unwrap_or_default())
    }

    /// 把若干条 Set-Cookie 合并进三元组对应的罐
    ///
    /// 同名覆盖（后写胜出），空值表示源站删除该 Cookie。
    /// 读-改-写放在一个事务里，并发写不会留下半写的行。
    pub async fn store(
        &self,
        site_id: i32,
        session_id: &str,
        origin_host: &str,
        set_cookie_lines: &[String],
    ) -> Result<()> {
        let mut incoming: Vec<(String, String)> = Vec::new();
        for line in set_cookie_lines {
            if let Some(pair) = parse_set_cookie_line(line) {
                incoming.push(pair);
            }
        }
        if incoming.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await?;

        let existing = entity::CookieJars::find()
            .filter(entity::cookie_jars::Column::SiteId.eq(site_id))
            .filter(entity::cookie_jars::Column::SessionId.eq(session_id))
            .filter(entity::cookie_jars::Column::OriginHost.eq(origin_host))
            .one(&txn)
            .await?;

        let mut cookies: HashMap<String, String> = existing
            .as_ref()
            .and_then(|row| row.cookie_data.as_deref())
            .and_then(|data| serde_json::from_str(data).ok())
            .unwrap_or_default();

        for (name, value) in incoming {
            if value.is_empty() {
                cookies.remove(&name);
            } else {
                cookies.insert(name, value);
            }
        }

        let data = serde_json::to_string(&cookies)?;
        let now = chrono::Utc::now().naive_utc();

        match existing {
            Some(row) => {
                let mut active: entity::cookie_jars::ActiveModel = row.into();
                active.cookie_data = Set(Some(data));
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
            None => {
                let active = entity::cookie_jars::ActiveModel {
                    site_id: Set(site_id),
                    session_id: Set(session_id.to_string()),
                    origin_host: Set(origin_host.to_string()),
                    cookie_data: Set(Some(data)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }
}
