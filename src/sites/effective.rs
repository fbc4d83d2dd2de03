//! # 有效配置合并
//!
//! 逐请求的配置视图：站点级非空字段覆盖全局配置行，再覆盖硬编码默认值。

use serde::{Deserialize, Serialize};

/// 媒体资源代理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaPolicy {
    /// 媒体 URL 保持指向源站，不经过镜像
    Bypass,
    /// 媒体照常走镜像代理
    Proxy,
    /// 走镜像代理并受大小上限约束
    SizeLimited,
}

impl MediaPolicy {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bypass" => Some(Self::Bypass),
            "proxy" => Some(Self::Proxy),
            "size_limited" => Some(Self::SizeLimited),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::Proxy => "proxy",
            Self::SizeLimited => "size_limited",
        }
    }
}

/// 会话模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// 不维护服务端会话，源站 Cookie 直接丢弃
    Stateless,
    /// 按 (站点, 会话, 源站主机) 维护服务端 Cookie 罐
    CookieJar,
}

impl SessionMode {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stateless" => Some(Self::Stateless),
            "cookie_jar" => Some(Self::CookieJar),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stateless => "stateless",
            Self::CookieJar => "cookie_jar",
        }
    }
}

/// 单个请求的有效配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub proxy_subdomains: bool,
    pub proxy_external_domains: bool,
    pub rewrite_js_redirects: bool,
    pub remove_ads: bool,
    pub inject_ads: bool,
    pub remove_analytics: bool,
    pub media_policy: MediaPolicy,
    pub session_mode: SessionMode,
    pub custom_ad_html: Option<String>,
    pub custom_tracker_js: Option<String>,
}

impl Default for EffectiveConfig {
    /// 硬编码默认值，在站点与全局配置都未给出时生效
    fn default() -> Self {
        Self {
            proxy_subdomains: true,
            proxy_external_domains: true,
            rewrite_js_redirects: true,
            remove_ads: false,
            inject_ads: false,
            remove_analytics: false,
            media_policy: MediaPolicy::Proxy,
            session_mode: SessionMode::Stateless,
            custom_ad_html: None,
            custom_tracker_js: None,
        }
    }
}

/// 合并站点覆盖项、全局配置行与硬编码默认值
#[must_use]
pub fn effective_config(
    site: &entity::sites::Model,
    global: Option<&entity::global_config::Model>,
) -> EffectiveConfig {
    let defaults = EffectiveConfig::default();

    let from_global = |f: fn(&entity::global_config::Model) -> bool, d: bool| -> bool {
        global.map_or(d, f)
    };

    EffectiveConfig {
        proxy_subdomains: site
            .proxy_subdomains
            .unwrap_or_else(|| from_global(|g| g.proxy_subdomains, defaults.proxy_subdomains)),
        proxy_external_domains: site.proxy_external_domains.unwrap_or_else(|| {
            from_global(
                |g| g.proxy_external_domains,
                defaults.proxy_external_domains,
            )
        }),
        rewrite_js_redirects: site.rewrite_js_redirects.unwrap_or_else(|| {
            from_global(|g| g.rewrite_js_redirects, defaults.rewrite_js_redirects)
        }),
        remove_ads: site
            .remove_ads
            .unwrap_or_else(|| from_global(|g| g.remove_ads, defaults.remove_ads)),
        inject_ads: site
            .inject_ads
            .unwrap_or_else(|| from_global(|g| g.inject_ads, defaults.inject_ads)),
        remove_analytics: site
            .remove_analytics
            .unwrap_or_else(|| from_global(|g| g.remove_analytics, defaults.remove_analytics)),
        media_policy: site
            .media_policy
            .as_deref()
            .and_then(MediaPolicy::parse)
            .or_else(|| global.and_then(|g| MediaPolicy::parse(&g.media_policy)))
            .unwrap_or(defaults.media_policy),
        session_mode: site
            .session_mode
            .as_deref()
            .and_then(SessionMode::parse)
            .or_else(|| global.and_then(|g| SessionMode::parse(&g.session_mode)))
            .unwrap_or(defaults.session_mode),
        custom_ad_html: site
            .custom_ad_html
            .clone()
            .or_else(|| global.and_then(|g| g.custom_ad_html.clone())),
        custom_tracker_js: site
            .custom_tracker_js
            .clone()
            .or_else(|| global.and_then(|g| g.custom_tracker_js.clone())),
    }
}
