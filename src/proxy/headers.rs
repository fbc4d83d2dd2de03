//! # 请求/响应头策略
//!
//! 入站只转发白名单内的请求头；出站剥掉会暴露源站策略或
//! 破坏镜像的响应头。

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use url::{Position, Url};

use crate::mapping;

/// 转发到源站的请求头白名单
pub const FORWARD_REQUEST_HEADERS: &[&str] =
    &["user-agent", "accept", "accept-language", "content-type"];

/// 出站剥除的响应头
const STRIP_RESPONSE_HEADERS: &[&str] = &[
    "set-cookie",
    "content-security-policy",
    "content-security-policy-report-only",
    "strict-transport-security",
    "x-frame-options",
    "content-length",
    "content-encoding",
    "transfer-encoding",
];

/// 过滤源站响应头
///
/// 剥除名单内的头与所有 `Access-Control-*`。Content-Length 由响应体
/// 重新计算，Content-Encoding 在客户端解压后不再成立。
#[must_use]
pub fn sanitize_response_headers(origin_headers: &HeaderMap) -> HeaderMap {
    let mut sanitized = HeaderMap::new();
    for (name, value) in origin_headers {
        let lower = name.as_str().to_ascii_lowercase();
        if STRIP_RESPONSE_HEADERS.contains(&lower.as_str()) {
            continue;
        }
        if lower.starts_with("access-control-") {
            continue;
        }
        sanitized.append(name.clone(), value.clone());
    }
    sanitized
}

/// 构造发往源站的请求头
///
/// 白名单逐个拷贝；Host 覆盖为源站主机；Referer 按镜像 URL 反解为
/// 源站等价形式，解不出来就丢弃。
#[must_use]
pub fn build_forward_headers(
    incoming: &HeaderMap,
    origin_url: &Url,
    mirror_root: &str,
    source_root: &str,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in FORWARD_REQUEST_HEADERS {
        if let Some(value) = incoming.get(*name) {
            if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) {
                headers.insert(header_name, value.clone());
            }
        }
    }

    if let Some(host) = origin_url.host_str() {
        if let Ok(value) = HeaderValue::from_str(host) {
            headers.insert(axum::http::header::HOST, value);
        }
    }

    if let Some(referer) = incoming
        .get(axum::http::header::REFERER)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(mapped) = map_referer_to_origin(referer, mirror_root, source_root) {
            if let Ok(value) = HeaderValue::from_str(&mapped) {
                headers.insert(axum::http::header::REFERER, value);
            }
        }
    }

    headers
}

/// 把镜像侧的 Referer 转换成源站等价 URL
fn map_referer_to_origin(referer: &str, mirror_root: &str, source_root: &str) -> Option<String> {
    let parsed = Url::parse(referer).ok()?;
    let host = parsed.host_str()?;
    let path_and_query = &parsed[Position::BeforePath..];
    let origin = mapping::build_origin_url(host, path_and_query, mirror_root, source_root)?;
    Some(origin.to_string())
}
