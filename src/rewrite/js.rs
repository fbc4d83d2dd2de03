//! # 内联脚本跳转改写
//!
//! 粗粒度的正则识别，只认四种字面跳转写法：
//! `window.location.href =`、`location.href =`、`location.replace(...)`、
//! `location =`。不做变量追踪，不建 AST。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::RewriteContext;

/// 赋值形式：`[window.]location[.href] = "URL"`
static JS_ASSIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\b(?:window\.)?location(?:\.href)?\s*=\s*)(["'])([^"']+)["']"#)
        .expect("static regex")
});

/// 调用形式：`location.replace("URL")`
static JS_REPLACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\blocation\.replace\s*\(\s*)(["'])([^"']+)["'](\s*\))"#).expect("static regex")
});

/// 改写一段内联 JavaScript 中的跳转 URL，保持引号风格
#[must_use]
pub fn rewrite_js_redirects(js: &str, ctx: &RewriteContext<'_>) -> String {
    if js.is_empty() {
        return js.to_string();
    }

    let rewritten = JS_ASSIGN_RE.replace_all(js, |caps: &Captures<'_>| {
        let quote = &caps[2];
        let url = ctx.rewrite_url(&caps[3]);
        format!("{}{quote}{url}{quote}", &caps[1])
    });

    JS_REPLACE_RE
        .replace_all(&rewritten, |caps: &Captures<'_>| {
            let quote = &caps[2];
            let url = ctx.rewrite_url(&caps[3]);
            format!("{}{quote}{url}{quote}{}", &caps[1], &caps[4])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::EffectiveConfig;
    use url::Url;

    fn with_ctx(js: &str) -> String {
        let page = Url::parse("https://example.com/page").unwrap();
        let effective = EffectiveConfig::default();
        let ctx = RewriteContext {
            mirror_host: "m.test",
            mirror_root: "m.test",
            source_root: "example.com",
            effective: &effective,
            page_origin_url: &page,
        };
        rewrite_js_redirects(js, &ctx)
    }

    #[test]
    fn rewrites_the_four_redirect_forms() {
        assert_eq!(
            with_ctx(r#"window.location.href = "https://example.com/a";"#),
            r#"window.location.href = "https://m.test/a";"#
        );
        assert_eq!(
            with_ctx(r"location.href = 'https://example.com/b';"),
            r"location.href = 'https://m.test/b';"
        );
        assert_eq!(
            with_ctx(r#"location.replace("https://example.com/c")"#),
            r#"location.replace("https://m.test/c")"#
        );
        assert_eq!(
            with_ctx(r#"location = "/relative";"#),
            r#"location = "https://m.test/relative";"#
        );
    }

    #[test]
    fn preserves_quote_style() {
        let out = with_ctx(r"location.href = '/x'");
        assert!(out.contains('\''));
        assert!(!out.contains('"'));
    }

    #[test]
    fn leaves_unrelated_js_untouched() {
        let js = r#"var allocation = "pool"; if (location.hash) { f(); }"#;
        assert_eq!(with_ctx(js), js);
    }

    #[test]
    fn comparison_is_not_an_assignment() {
        let js = r#"if (location.href == "https://example.com/a") {}"#;
        assert_eq!(with_ctx(js), js);
    }
}
