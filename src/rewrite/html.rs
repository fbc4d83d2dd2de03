//! # HTML 改写器
//!
//! 基于 lol_html 的单遍流式改写：枚举出的属性逐个过 URL 映射，
//! 内联 script/style 文本按节点缓冲后交给正则改写，广告/统计节点
//! 在同一次解析里移除，运营方内容在 `</body>` 前注入。未触碰的
//! 字节原样透传，文档顺序与 doctype 不变。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lol_html::html_content::{ContentType, Element};
use lol_html::{HtmlRewriter, Settings, element, end, text};

use super::{RewriteContext, ads, css, js};
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

/// 改写整个 HTML 响应体
///
/// 解析失败不致命：退回原始字节透传。
#[must_use]
pub fn rewrite_html(body: &[u8], ctx: &RewriteContext<'_>) -> Vec<u8> {
    match run_rewriter(body, ctx) {
        Ok(out) => out,
        Err(e) => {
            lwarn!(
                "rewrite",
                LogStage::Rewrite,
                LogComponent::Rewriter,
                "rewrite_failed",
                &format!("html rewrite failed, passing body through: {e}")
            );
            body.to_vec()
        }
    }
}

fn rewrite_attr(
    el: &mut Element<'_, '_>,
    attr: &str,
    ctx: &RewriteContext<'_>,
) -> Result<(), lol_html::errors::AttributeNameError> {
    if let Some(value) = el.get_attribute(attr) {
        let rewritten = ctx.rewrite_url(&value);
        if rewritten != value {
            el.set_attribute(attr, &rewritten)?;
        }
    }
    Ok(())
}

/// srcset 的每个候选 URL 独立改写，描述符原样保留
fn rewrite_srcset(value: &str, ctx: &RewriteContext<'_>) -> String {
    value
        .split(',')
        .map(|candidate| {
            let candidate = candidate.trim();
            match candidate.rsplit_once(' ') {
                Some((url, descriptor)) => {
                    format!("{} {descriptor}", ctx.rewrite_url(url.trim()))
                }
                None => ctx.rewrite_url(candidate),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn rewrite_srcset_attr(
    el: &mut Element<'_, '_>,
    ctx: &RewriteContext<'_>,
) -> Result<(), lol_html::errors::AttributeNameError> {
    if let Some(value) = el.get_attribute("srcset") {
        let rewritten = rewrite_srcset(&value, ctx);
        if rewritten != value {
            el.set_attribute("srcset", &rewritten)?;
        }
    }
    Ok(())
}

fn run_rewriter(
    body: &[u8],
    ctx: &RewriteContext<'_>,
) -> Result<Vec<u8>, lol_html::errors::RewritingError> {
    let mut output = Vec::with_capacity(body.len());

    let filtering = ctx.effective.remove_ads || ctx.effective.remove_analytics;
    let injection = ads::injection_snippet(ctx.effective).map(Rc::new);

    // <script> 文本只在无 src 时缓冲：过滤与跳转改写都要看完整脚本体
    let inline_script = Rc::new(Cell::new(false));
    let script_buf = Rc::new(RefCell::new(String::new()));
    let style_buf = Rc::new(RefCell::new(String::new()));
    let injected = Rc::new(Cell::new(false));

    let inline_script_flag = Rc::clone(&inline_script);

    let mut element_content_handlers = vec![
        element!("a[href]", |el| {
            rewrite_attr(el, "href", ctx)?;
            Ok(())
        }),
        element!("form[action]", |el| {
            rewrite_attr(el, "action", ctx)?;
            Ok(())
        }),
        element!("iframe[src]", |el| {
            if filtering {
                if let Some(src) = el.get_attribute("src") {
                    if ads::src_matches_ad_token(&src) {
                        el.remove();
                        return Ok(());
                    }
                }
            }
            rewrite_attr(el, "src", ctx)?;
            Ok(())
        }),
        element!("link[href]", |el| {
            rewrite_attr(el, "href", ctx)?;
            Ok(())
        }),
        element!("img[src]", |el| {
            rewrite_attr(el, "src", ctx)?;
            Ok(())
        }),
        element!("img[srcset]", |el| {
            rewrite_srcset_attr(el, ctx)?;
            Ok(())
        }),
        element!("source[src]", |el| {
            rewrite_attr(el, "src", ctx)?;
            Ok(())
        }),
        element!("source[srcset]", |el| {
            rewrite_srcset_attr(el, ctx)?;
            Ok(())
        }),
        element!("video[src]", |el| {
            rewrite_attr(el, "src", ctx)?;
            Ok(())
        }),
        element!("audio[src]", |el| {
            rewrite_attr(el, "src", ctx)?;
            Ok(())
        }),
        element!("base[href]", |el| {
            rewrite_attr(el, "href", ctx)?;
            Ok(())
        }),
        element!("script", move |el| {
            match el.get_attribute("src") {
                Some(src) => {
                    inline_script_flag.set(false);
                    if filtering && ads::src_matches_ad_token(&src) {
                        el.remove();
                    } else {
                        rewrite_attr(el, "src", ctx)?;
                    }
                }
                None => inline_script_flag.set(true),
            }
            Ok(())
        }),
        text!("script", move |chunk| {
            if !inline_script.get() || (!filtering && !ctx.effective.rewrite_js_redirects) {
                return Ok(());
            }
            script_buf.borrow_mut().push_str(chunk.as_str());
            if chunk.last_in_text_node() {
                let buffered = std::mem::take(&mut *script_buf.borrow_mut());
                // 过滤先于改写：统计脚本整体清空，其余再做跳转改写
                if filtering && ads::body_matches_tracker(&buffered) {
                    chunk.remove();
                } else if ctx.effective.rewrite_js_redirects {
                    let rewritten = js::rewrite_js_redirects(&buffered, ctx);
                    chunk.replace(&rewritten, ContentType::Html);
                } else {
                    chunk.replace(&buffered, ContentType::Html);
                }
            } else {
                chunk.remove();
            }
            Ok(())
        }),
        text!("style", move |chunk| {
            style_buf.borrow_mut().push_str(chunk.as_str());
            if chunk.last_in_text_node() {
                let buffered = std::mem::take(&mut *style_buf.borrow_mut());
                let rewritten = css::rewrite_css_urls(&buffered, ctx);
                chunk.replace(&rewritten, ContentType::Html);
            } else {
                chunk.remove();
            }
            Ok(())
        }),
        element!("[style]", |el| {
            if let Some(style) = el.get_attribute("style") {
                if style.contains("url(") {
                    let rewritten = css::rewrite_css_urls(&style, ctx);
                    if rewritten != style {
                        el.set_attribute("style", &rewritten)?;
                    }
                }
            }
            Ok(())
        }),
    ];

    let mut document_content_handlers = vec![];
    if let Some(snippet) = &injection {
        // 注入在 </body> 前；注入内容不会再被本次解析的处理器处理
        let body_snippet = Rc::clone(snippet);
        let body_injected = Rc::clone(&injected);
        element_content_handlers.push(element!("body", move |el| {
            let snippet = Rc::clone(&body_snippet);
            let injected = Rc::clone(&body_injected);
            if let Some(handlers) = el.end_tag_handlers() {
                handlers.push(Box::new(move |end_tag| {
                    end_tag.before(&snippet, ContentType::Html);
                    injected.set(true);
                    Ok(())
                }));
            }
            Ok(())
        }));

        // 没有 </body> 的残缺文档：退化为追加到文档末尾
        let end_snippet = Rc::clone(snippet);
        let end_injected = Rc::clone(&injected);
        document_content_handlers.push(end!(move |doc_end| {
            if !end_injected.get() {
                doc_end.append(&end_snippet, ContentType::Html);
            }
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers,
            document_content_handlers,
            strict: false,
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(body)?;
    rewriter.end()?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::EffectiveConfig;
    use url::Url;

    fn rewrite_with(html: &str, effective: &EffectiveConfig) -> String {
        let page = Url::parse("https://example.com/").unwrap();
        let ctx = RewriteContext {
            mirror_host: "m.test",
            mirror_root: "m.test",
            source_root: "example.com",
            effective,
            page_origin_url: &page,
        };
        String::from_utf8(rewrite_html(html.as_bytes(), &ctx)).unwrap()
    }

    fn rewrite(html: &str) -> String {
        rewrite_with(html, &EffectiveConfig::default())
    }

    fn cleaning_config() -> EffectiveConfig {
        EffectiveConfig {
            remove_ads: true,
            remove_analytics: true,
            ..EffectiveConfig::default()
        }
    }

    #[test]
    fn rewrites_anchor_hrefs() {
        let out = rewrite(r#"<a href="https://example.com/x">x</a>"#);
        assert_eq!(out, r#"<a href="https://m.test/x">x</a>"#);
    }

    #[test]
    fn rewrites_srcset_candidates_independently() {
        let out = rewrite(r#"<img srcset="/a.png 1x, /b.png 2x" src="/a.png">"#);
        assert!(out.contains("https://m.test/a.png 1x"));
        assert!(out.contains("https://m.test/b.png 2x"));
    }

    #[test]
    fn rewrites_inline_script_redirects() {
        let out = rewrite(r#"<script>location.href = "https://example.com/next";</script>"#);
        assert!(out.contains(r#"location.href = "https://m.test/next";"#));
    }

    #[test]
    fn external_script_src_is_rewritten_but_not_its_body() {
        let out = rewrite(r#"<script src="https://example.com/app.js"></script>"#);
        assert!(out.contains(r#"src="https://m.test/app.js""#));
    }

    #[test]
    fn rewrites_style_blocks_and_attributes() {
        let out = rewrite(
            r#"<style>body { background: url(/bg.html); }</style><div style="background: url('/x')">d</div>"#,
        );
        assert!(out.contains("url(https://m.test/bg.html)"));
        assert!(out.contains("url('https://m.test/x')"));
    }

    #[test]
    fn removes_ad_scripts_and_iframes_by_src_token() {
        let html = concat!(
            "<body>",
            "<script src=\"https://pagead2.googlesyndication.com/x.js\"></script>",
            "<script src=\"https://example.com/app.js\"></script>",
            "<iframe src=\"https://ad.doubleclick.net/frame\"><p>ad</p></iframe>",
            "<iframe src=\"https://example.com/video\"></iframe>",
            "</body>"
        );
        let out = rewrite_with(html, &cleaning_config());
        assert!(!out.contains("googlesyndication"));
        assert!(!out.contains("doubleclick"));
        assert!(out.contains("app.js"));
        assert!(out.contains("video"));
    }

    #[test]
    fn empties_inline_tracking_scripts() {
        let html = concat!(
            "<body>",
            "<script>gtag('config', 'UA-1');</script>",
            "<script>console.log('keep me');</script>",
            "</body>"
        );
        let out = rewrite_with(html, &cleaning_config());
        assert!(!out.contains("gtag"));
        assert!(out.contains("keep me"));
    }

    #[test]
    fn disabled_filter_keeps_inline_trackers() {
        let html = "<body><script>gtag('x');</script></body>";
        let out = rewrite(html);
        assert!(out.contains("gtag('x');"));
    }

    #[test]
    fn injects_before_body_close() {
        let effective = EffectiveConfig {
            inject_ads: true,
            custom_ad_html: Some("<div id=\"promo\"></div>".to_string()),
            custom_tracker_js: Some("track();".to_string()),
            ..EffectiveConfig::default()
        };
        let out = rewrite_with("<html><body><p>hi</p></body></html>", &effective);
        let promo = out.find("promo").unwrap();
        let tracker = out.find("track();").unwrap();
        let body_close = out.find("</body>").unwrap();
        assert!(promo < tracker);
        assert!(tracker < body_close);
    }

    #[test]
    fn missing_body_tag_appends_at_document_end() {
        let effective = EffectiveConfig {
            custom_tracker_js: Some("t();".to_string()),
            ..EffectiveConfig::default()
        };
        let out = rewrite_with("<p>fragment</p>", &effective);
        assert!(out.ends_with("<script>t();</script>"));
    }

    #[test]
    fn malformed_html_does_not_panic() {
        let out = rewrite("<a href=\"https://example.com/x\"><div><<<>broken");
        assert!(out.contains("https://m.test/x"));
    }
}
