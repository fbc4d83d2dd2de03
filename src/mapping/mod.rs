//! # URL 映射代数
//!
//! 镜像 URL 与源站 URL 之间的纯函数映射，不做任何 IO。
//! 这里的正反两个方向必须严格互逆，否则镜像内导航会悄悄断掉：
//! `build_origin_url` 处理入站请求，`map_origin_url_to_mirror` 处理
//! 重定向与页面改写，`rewrite_url_in_page` 是页面内 URL 的入口。

mod media;

pub use media::is_media_url;

use url::{Position, Url};

use crate::sites::{EffectiveConfig, MediaPolicy};

/// 镜像主机名 → 源站主机名
///
/// 精确等于镜像根域名时返回源站根域名；以 `.镜像根` 结尾时把
/// 子域名前缀原样搬到源站根域名上；否则不是镜像主机。
#[must_use]
pub fn map_mirror_host_to_origin_host(
    mirror_host: &str,
    mirror_root: &str,
    source_root: &str,
) -> Option<String> {
    if mirror_host == mirror_root {
        return Some(source_root.to_string());
    }
    let suffix = format!(".{mirror_root}");
    mirror_host
        .strip_suffix(&suffix)
        .map(|prefix| format!("{prefix}.{source_root}"))
}

/// 路径首段是否是编码后的外部域名
///
/// 含点且不含空格的首段按外部域名处理。已知的歧义边界：源站自身的
/// 字面路径若首段含点也会被当成外部域名。
#[must_use]
pub fn is_encoded_external_host(segment: &str) -> bool {
    segment.contains('.') && !segment.contains(' ') && !segment.is_empty()
}

/// 由入站的镜像主机与路径构造要抓取的源站 URL
///
/// 路径首段形如域名时按编码外部 URL 解释为 `https://<首段>/<剩余路径>`，
/// 否则把镜像主机映射为源站主机后拼接原路径。协议固定 https。
pub fn build_origin_url(
    mirror_host: &str,
    path_and_query: &str,
    mirror_root: &str,
    source_root: &str,
) -> Option<Url> {
    let host = crate::sites::normalize_host(mirror_host);

    let pq = if path_and_query.starts_with('/') {
        path_and_query.to_string()
    } else {
        format!("/{path_and_query}")
    };
    let (path, query) = match pq.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (pq, None),
    };

    let trimmed = path.trim_start_matches('/');
    let (first_segment, remaining) = match trimmed.split_once('/') {
        Some((seg, rest)) => (seg, format!("/{rest}")),
        None => (trimmed, "/".to_string()),
    };

    let raw = if is_encoded_external_host(first_segment) {
        // 编码的外部 URL：/abc.external.com/path → https://abc.external.com/path
        match &query {
            Some(q) => format!("https://{first_segment}{remaining}?{q}"),
            None => format!("https://{first_segment}{remaining}"),
        }
    } else {
        let origin_host = map_mirror_host_to_origin_host(&host, mirror_root, source_root)?;
        match &query {
            Some(q) => format!("https://{origin_host}{path}?{q}"),
            None => format!("https://{origin_host}{path}"),
        }
    };

    Url::parse(&raw).ok()
}

/// 源站 URL → 镜像 URL（重定向拦截与页面改写共用的反向映射）
///
/// 非 http(s) 或无主机的输入原样返回。源站域及其子域按主机映射换根；
/// 已经指向镜像域的 URL 原样保留，保证改写幂等；其余外部域在
/// `proxy_external_domains` 开启时编码为镜像路径首段。
#[must_use]
pub fn map_origin_url_to_mirror(
    origin_url: &str,
    mirror_root: &str,
    source_root: &str,
    effective: &EffectiveConfig,
    mirror_host: &str,
) -> String {
    let Ok(parsed) = Url::parse(origin_url) else {
        return origin_url.to_string();
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return origin_url.to_string();
    }
    let Some(host) = parsed.host_str() else {
        return origin_url.to_string();
    };
    let host = host.to_ascii_lowercase();

    // 路径+查询+片段，保持解析到的原样
    let rest = &parsed[Position::BeforePath..];

    // 已经是镜像 URL：保持不动，页面可以被重复改写
    if host == mirror_root || host.ends_with(&format!(".{mirror_root}")) {
        return origin_url.to_string();
    }

    if host == source_root {
        return format!("https://{mirror_root}{rest}");
    }

    let source_suffix = format!(".{source_root}");
    if let Some(prefix) = host.strip_suffix(&source_suffix) {
        if effective.proxy_subdomains {
            return format!("https://{prefix}.{mirror_root}{rest}");
        }
        // 子域代理关闭时按外部域处理
    }

    if effective.proxy_external_domains {
        return format!("https://{mirror_host}/{host}{rest}");
    }

    origin_url.to_string()
}

/// 页面内单个 URL 的改写入口
///
/// 先把相对/协议相对形式解析到页面源站 URL 上，再按媒体策略与
/// 反向映射处理。特殊 scheme 与纯片段保持原样。
#[must_use]
pub fn rewrite_url_in_page(
    url: &str,
    page_origin_url: &Url,
    mirror_root: &str,
    source_root: &str,
    effective: &EffectiveConfig,
    mirror_host: &str,
) -> String {
    if url.is_empty()
        || url.starts_with("data:")
        || url.starts_with("javascript:")
        || url.starts_with("mailto:")
        || url.starts_with('#')
    {
        return url.to_string();
    }

    let absolute = if let Some(rest) = url.strip_prefix("//") {
        // 协议相对：继承页面协议
        format!("{}://{}", page_origin_url.scheme(), rest)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        match page_origin_url.join(url) {
            Ok(joined) => joined.to_string(),
            Err(_) => return url.to_string(),
        }
    };

    if is_media_url(&absolute) && effective.media_policy == MediaPolicy::Bypass {
        // bypass 策略：媒体保持指向源站
        return absolute;
    }

    map_origin_url_to_mirror(&absolute, mirror_root, source_root, effective, mirror_host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EffectiveConfig {
        EffectiveConfig::default()
    }

    #[test]
    fn host_mapping_preserves_subdomain_prefix() {
        assert_eq!(
            map_mirror_host_to_origin_host("m.test", "m.test", "example.com").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            map_mirror_host_to_origin_host("xyz.abc.m.test", "m.test", "example.com").as_deref(),
            Some("xyz.abc.example.com")
        );
        assert!(map_mirror_host_to_origin_host("other.test", "m.test", "example.com").is_none());
    }

    #[test]
    fn build_origin_url_maps_plain_paths() {
        let url = build_origin_url("m.test", "/foo/bar?x=1", "m.test", "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/foo/bar?x=1");
    }

    #[test]
    fn build_origin_url_keeps_subdomain() {
        let url = build_origin_url("sub.m.test", "/", "m.test", "example.com").unwrap();
        assert_eq!(url.as_str(), "https://sub.example.com/");
    }

    #[test]
    fn build_origin_url_decodes_external_segment() {
        let url = build_origin_url("m.test", "/other.org/y", "m.test", "example.com").unwrap();
        assert_eq!(url.as_str(), "https://other.org/y");

        let url = build_origin_url("m.test", "/cdn.other.org/", "m.test", "example.com").unwrap();
        assert_eq!(url.as_str(), "https://cdn.other.org/");
    }

    #[test]
    fn build_origin_url_rejects_foreign_host() {
        assert!(build_origin_url("stranger.test", "/", "m.test", "example.com").is_none());
    }

    #[test]
    fn origin_to_mirror_exact_and_subdomain() {
        assert_eq!(
            map_origin_url_to_mirror(
                "https://example.com/x?a=1#frag",
                "m.test",
                "example.com",
                &cfg(),
                "m.test"
            ),
            "https://m.test/x?a=1#frag"
        );
        assert_eq!(
            map_origin_url_to_mirror(
                "https://up.example.com/f",
                "m.test",
                "example.com",
                &cfg(),
                "m.test"
            ),
            "https://up.m.test/f"
        );
    }

    #[test]
    fn origin_to_mirror_encodes_external_hosts() {
        assert_eq!(
            map_origin_url_to_mirror(
                "https://other.org/y",
                "m.test",
                "example.com",
                &cfg(),
                "m.test"
            ),
            "https://m.test/other.org/y"
        );
    }

    #[test]
    fn origin_to_mirror_leaves_special_inputs_alone() {
        let effective = cfg();
        for u in [
            "ftp://example.com/file",
            "not a url at all",
            "https://m.test/already/mirrored",
        ] {
            assert_eq!(
                map_origin_url_to_mirror(u, "m.test", "example.com", &effective, "m.test"),
                u
            );
        }
    }

    #[test]
    fn external_encoding_disabled_keeps_origin() {
        let effective = EffectiveConfig {
            proxy_external_domains: false,
            ..EffectiveConfig::default()
        };
        assert_eq!(
            map_origin_url_to_mirror(
                "https://other.org/y",
                "m.test",
                "example.com",
                &effective,
                "m.test"
            ),
            "https://other.org/y"
        );
    }

    #[test]
    fn round_trip_subdomain_urls() {
        let effective = cfg();
        for original in [
            "https://example.com/",
            "https://example.com/a/b?q=1",
            "https://news.example.com/story?id=7",
        ] {
            let mirrored = map_origin_url_to_mirror(
                original,
                "m.test",
                "example.com",
                &effective,
                "m.test",
            );
            let parsed = Url::parse(&mirrored).unwrap();
            let back = build_origin_url(
                parsed.host_str().unwrap(),
                &parsed[Position::BeforePath..],
                "m.test",
                "example.com",
            )
            .unwrap();
            assert_eq!(back.as_str(), original);
        }
    }

    #[test]
    fn round_trip_external_urls() {
        let effective = cfg();
        let original = "https://other.org/path/deep?q=2";
        let mirrored =
            map_origin_url_to_mirror(original, "m.test", "example.com", &effective, "m.test");
        assert_eq!(mirrored, "https://m.test/other.org/path/deep?q=2");
        let parsed = Url::parse(&mirrored).unwrap();
        let back = build_origin_url(
            parsed.host_str().unwrap(),
            &parsed[Position::BeforePath..],
            "m.test",
            "example.com",
        )
        .unwrap();
        assert_eq!(back.as_str(), original);
    }

    #[test]
    fn rewrite_resolves_relative_and_protocol_relative() {
        let page = Url::parse("https://example.com/dir/page.html").unwrap();
        let effective = cfg();

        assert_eq!(
            rewrite_url_in_page("/x", &page, "m.test", "example.com", &effective, "m.test"),
            "https://m.test/x"
        );
        assert_eq!(
            rewrite_url_in_page(
                "other.html",
                &page,
                "m.test",
                "example.com",
                &effective,
                "m.test"
            ),
            "https://m.test/dir/other.html"
        );
        assert_eq!(
            rewrite_url_in_page(
                "//cdn.example.com/app.js",
                &page,
                "m.test",
                "example.com",
                &effective,
                "m.test"
            ),
            "https://cdn.m.test/app.js"
        );
    }

    #[test]
    fn rewrite_skips_special_schemes_and_fragments() {
        let page = Url::parse("https://example.com/").unwrap();
        let effective = cfg();
        for u in [
            "",
            "#section",
            "data:image/png;base64,AAAA",
            "javascript:void(0)",
            "mailto:a@b.c",
        ] {
            assert_eq!(
                rewrite_url_in_page(u, &page, "m.test", "example.com", &effective, "m.test"),
                u
            );
        }
    }

    #[test]
    fn rewrite_honors_media_bypass() {
        let page = Url::parse("https://example.com/").unwrap();
        let bypass = EffectiveConfig {
            media_policy: MediaPolicy::Bypass,
            ..EffectiveConfig::default()
        };
        assert_eq!(
            rewrite_url_in_page(
                "/img/logo.png",
                &page,
                "m.test",
                "example.com",
                &bypass,
                "m.test"
            ),
            "https://example.com/img/logo.png"
        );
        // proxy 策略下媒体照常走镜像
        assert_eq!(
            rewrite_url_in_page(
                "/img/logo.png",
                &page,
                "m.test",
                "example.com",
                &cfg(),
                "m.test"
            ),
            "https://m.test/img/logo.png"
        );
    }

    #[test]
    fn rewrite_is_idempotent_on_mirror_urls() {
        let page = Url::parse("https://example.com/").unwrap();
        let effective = cfg();
        let once = rewrite_url_in_page(
            "https://example.com/x",
            &page,
            "m.test",
            "example.com",
            &effective,
            "m.test",
        );
        let twice = rewrite_url_in_page(&once, &page, "m.test", "example.com", &effective, "m.test");
        assert_eq!(once, twice);
    }
}
