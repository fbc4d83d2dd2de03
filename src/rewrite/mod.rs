//! # 响应体改写模块
//!
//! HTML 响应在一次流式解析里完成三件事：广告/统计节点移除、
//! URL 改写、运营方内容注入。只处理 `text/html`；其余内容类型
//! 由引擎原样透传。

pub mod ads;
pub mod css;
pub mod html;
pub mod js;

use url::Url;

use crate::mapping;
use crate::sites::EffectiveConfig;

pub use html::rewrite_html;

/// 一次 HTML 改写所需的上下文
pub struct RewriteContext<'a> {
    /// 本次请求实际使用的镜像主机（可能带子域名前缀）
    pub mirror_host: &'a str,
    pub mirror_root: &'a str,
    pub source_root: &'a str,
    pub effective: &'a EffectiveConfig,
    /// 当前页面的源站 URL，用于解析相对引用
    pub page_origin_url: &'a Url,
}

impl RewriteContext<'_> {
    /// 页面内单个 URL 的改写
    #[must_use]
    pub fn rewrite_url(&self, url: &str) -> String {
        mapping::rewrite_url_in_page(
            url,
            self.page_origin_url,
            self.mirror_root,
            self.source_root,
            self.effective,
            self.mirror_host,
        )
    }
}

/// 完整的 HTML 处理流水线（过滤、改写、注入都在同一次解析里）
#[must_use]
pub fn process_html(body: &[u8], ctx: &RewriteContext<'_>) -> Vec<u8> {
    rewrite_html(body, ctx)
}
