//! # CSS url() 改写
//!
//! 处理 `<style>` 体与 style 属性里的 `url(...)`，保持引号形式。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::RewriteContext;

/// 匹配 url("...")、url('...') 与裸 url(...)
static CSS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\s*\(\s*(["']?)([^"')]+)["']?\s*\)"#).expect("static regex"));

/// 改写一段 CSS 里的全部 url() 引用
#[must_use]
pub fn rewrite_css_urls(css: &str, ctx: &RewriteContext<'_>) -> String {
    if css.is_empty() {
        return css.to_string();
    }

    CSS_URL_RE
        .replace_all(css, |caps: &Captures<'_>| {
            let quote = &caps[1];
            let url = caps[2].trim();

            // data: 与纯片段不动
            if url.starts_with("data:") || url.starts_with('#') {
                return caps[0].to_string();
            }

            let rewritten = ctx.rewrite_url(url);
            format!("url({quote}{rewritten}{quote})")
        })
        .into_owned()
}
