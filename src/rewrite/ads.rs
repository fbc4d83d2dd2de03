//! # 广告/统计特征与注入内容
//!
//! 判定逻辑集中在这里；实际的节点移除与内容注入由 HTML 改写器的
//! 处理器在同一次解析里完成。

use crate::sites::EffectiveConfig;

/// src 中出现即移除的广告域特征
const AD_HOST_TOKENS: &[&str] = &[
    "doubleclick",
    "googlesyndication",
    "adsystem",
    "adservice",
    "adsbygoogle",
    "googletagmanager",
    "google-analytics",
    "googleadservices",
];

/// 内联脚本体中出现即清空的统计特征
const INLINE_SCRIPT_TOKENS: &[&str] = &[
    "gtag(",
    "ga(",
    "GoogleAnalyticsObject",
    "fbq(",
    "_gaq",
    "dataLayer",
];

/// script/iframe 的 src 是否命中广告域特征（大小写不敏感）
#[must_use]
pub fn src_matches_ad_token(src: &str) -> bool {
    let src = src.to_ascii_lowercase();
    AD_HOST_TOKENS.iter().any(|token| src.contains(token))
}

/// 内联脚本体是否包含统计代码特征
#[must_use]
pub fn body_matches_tracker(body: &str) -> bool {
    INLINE_SCRIPT_TOKENS.iter().any(|token| body.contains(token))
}

/// 组装注入到 `</body>` 前的内容
///
/// `inject_ads` 开启且有内容时先放 `custom_ad_html`；
/// `custom_tracker_js` 非空时再跟 `<script>…</script>`。
/// 没有可注入内容时返回 None，改写器不注册注入处理器。
#[must_use]
pub fn injection_snippet(effective: &EffectiveConfig) -> Option<String> {
    let ad_html = if effective.inject_ads {
        effective.custom_ad_html.as_deref().unwrap_or("")
    } else {
        ""
    };
    let tracker_js = effective.custom_tracker_js.as_deref().unwrap_or("");

    if ad_html.is_empty() && tracker_js.is_empty() {
        return None;
    }

    let mut snippet = String::with_capacity(ad_html.len() + tracker_js.len() + 17);
    snippet.push_str(ad_html);
    if !tracker_js.is_empty() {
        snippet.push_str("<script>");
        snippet.push_str(tracker_js);
        snippet.push_str("</script>");
    }
    Some(snippet)
}
