//! # URL 映射代数测试
//!
//! 镜像↔源站双向映射的互逆性与边界行为。

use proxibase::mapping::{
    build_origin_url, is_media_url, map_origin_url_to_mirror, rewrite_url_in_page,
};
use proxibase::sites::{EffectiveConfig, MediaPolicy};
use url::{Position, Url};

const MIRROR: &str = "m.test";
const SOURCE: &str = "example.com";

fn effective() -> EffectiveConfig {
    EffectiveConfig::default()
}

#[test]
fn mirror_host_request_maps_to_source_root() {
    let url = build_origin_url("m.test", "/", MIRROR, SOURCE).unwrap();
    assert_eq!(url.as_str(), "https://example.com/");
}

#[test]
fn subdomain_of_mirror_fetches_subdomain_of_source() {
    // Host: sub.m.test 的 GET / 抓取 https://sub.example.com/
    let url = build_origin_url("sub.m.test", "/", MIRROR, SOURCE).unwrap();
    assert_eq!(url.as_str(), "https://sub.example.com/");

    let url = build_origin_url("a.b.m.test", "/wiki/Rust?action=view", MIRROR, SOURCE).unwrap();
    assert_eq!(url.as_str(), "https://a.b.example.com/wiki/Rust?action=view");
}

#[test]
fn encoded_external_first_segment_is_decoded() {
    // GET /other.org/y 抓取 https://other.org/y
    let url = build_origin_url("m.test", "/other.org/y", MIRROR, SOURCE).unwrap();
    assert_eq!(url.as_str(), "https://other.org/y");

    // 查询串保留
    let url = build_origin_url("m.test", "/other.org/y?q=1", MIRROR, SOURCE).unwrap();
    assert_eq!(url.as_str(), "https://other.org/y?q=1");
}

#[test]
fn port_and_case_are_normalized_on_input() {
    let url = build_origin_url("M.Test:8443", "/x", MIRROR, SOURCE).unwrap();
    assert_eq!(url.as_str(), "https://example.com/x");
}

#[test]
fn subdomain_round_trip_holds() {
    // proxy_subdomains 开启时源站域及子域 URL 的映射可逆
    let effective = effective();
    for original in [
        "https://example.com/",
        "https://example.com/a/b/c?q=1",
        "https://upload.example.com/img?x=2",
        "https://a.b.example.com/deep/path",
    ] {
        let mirrored = map_origin_url_to_mirror(original, MIRROR, SOURCE, &effective, MIRROR);
        let parsed = Url::parse(&mirrored).unwrap();
        let back = build_origin_url(
            parsed.host_str().unwrap(),
            &parsed[Position::BeforePath..],
            MIRROR,
            SOURCE,
        )
        .unwrap();
        assert_eq!(back.as_str(), original, "round trip broke for {original}");
    }
}

#[test]
fn external_round_trip_holds() {
    // 任意外部 URL u 满足 build(mirror_root, "/" + host + path) == u
    for original in [
        "https://other.org/y",
        "https://cdn.other.org/assets/app.js?v=3",
    ] {
        let parsed = Url::parse(original).unwrap();
        let encoded_path = format!(
            "/{}{}",
            parsed.host_str().unwrap(),
            &parsed[Position::BeforePath..]
        );
        let back = build_origin_url(MIRROR, &encoded_path, MIRROR, SOURCE).unwrap();
        assert_eq!(back.as_str(), original);
    }
}

#[test]
fn redirect_location_mapping_preserves_path_query_fragment() {
    // 302 Location: https://example.com/login → https://m.test/login
    assert_eq!(
        map_origin_url_to_mirror(
            "https://example.com/login",
            MIRROR,
            SOURCE,
            &effective(),
            MIRROR
        ),
        "https://m.test/login"
    );
    assert_eq!(
        map_origin_url_to_mirror(
            "https://example.com/a?b=c#d",
            MIRROR,
            SOURCE,
            &effective(),
            MIRROR
        ),
        "https://m.test/a?b=c#d"
    );
}

#[test]
fn subdomain_mapping_respects_proxy_subdomains_flag() {
    let disabled = EffectiveConfig {
        proxy_subdomains: false,
        proxy_external_domains: false,
        ..EffectiveConfig::default()
    };
    // 子域代理关闭、外部代理也关闭时保持指向源站
    assert_eq!(
        map_origin_url_to_mirror(
            "https://sub.example.com/x",
            MIRROR,
            SOURCE,
            &disabled,
            MIRROR
        ),
        "https://sub.example.com/x"
    );
}

#[test]
fn percent_encoding_survives_mapping() {
    let effective = effective();
    let mirrored = map_origin_url_to_mirror(
        "https://example.com/wiki/D%C3%BCsseldorf?q=a%20b",
        MIRROR,
        SOURCE,
        &effective,
        MIRROR,
    );
    assert_eq!(mirrored, "https://m.test/wiki/D%C3%BCsseldorf?q=a%20b");
}

#[test]
fn page_relative_urls_resolve_against_origin_page() {
    let page = Url::parse("https://example.com/docs/guide/intro.html").unwrap();
    let effective = effective();

    assert_eq!(
        rewrite_url_in_page("../api.html", &page, MIRROR, SOURCE, &effective, MIRROR),
        "https://m.test/docs/api.html"
    );
    assert_eq!(
        rewrite_url_in_page("?page=2", &page, MIRROR, SOURCE, &effective, MIRROR),
        "https://m.test/docs/guide/intro.html?page=2"
    );
}

#[test]
fn media_extension_table_matches_reference_list() {
    for url in [
        "https://x.test/a.webp",
        "https://x.test/a.m3u8",
        "https://x.test/a.flac",
        "https://x.test/a.7z",
        "https://x.test/a.docx",
        "https://x.test/a.apk",
        "https://x.test/a.woff2",
    ] {
        assert!(is_media_url(url), "{url} should classify as media");
    }
    assert!(!is_media_url("https://x.test/article"));
    assert!(!is_media_url("https://x.test/a.html"));
}

#[test]
fn bypass_policy_keeps_media_on_origin_only_for_media() {
    let page = Url::parse("https://example.com/").unwrap();
    let bypass = EffectiveConfig {
        media_policy: MediaPolicy::Bypass,
        ..EffectiveConfig::default()
    };

    assert_eq!(
        rewrite_url_in_page("/v/clip.mp4", &page, MIRROR, SOURCE, &bypass, MIRROR),
        "https://example.com/v/clip.mp4"
    );
    // 非媒体路径照常改写
    assert_eq!(
        rewrite_url_in_page("/v/page", &page, MIRROR, SOURCE, &bypass, MIRROR),
        "https://m.test/v/page"
    );
}
