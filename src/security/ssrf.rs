//! # SSRF 防护
//!
//! 在每次发起源站请求前做字符串级校验：协议必须是 http(s)，
//! 字面 IP 不得落入回环、私有或链路本地网段。不做 DNS 解析。

use std::net::IpAddr;

use ipnet::IpNet;
use once_cell::sync::Lazy;
use url::{Host, Url};

/// 禁止访问的网段
static BLOCKED_NETS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    [
        "127.0.0.0/8",
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "169.254.0.0/16",
        "::1/128",
        "fe80::/10",
    ]
    .iter()
    .map(|net| net.parse().expect("static CIDR literal"))
    .collect()
});

fn blocked_net_for(addr: IpAddr) -> Option<&'static IpNet> {
    if let Some(net) = BLOCKED_NETS.iter().find(|net| net.contains(&addr)) {
        return Some(net);
    }
    // IPv4 映射的 v6 地址按其 v4 形式判断
    if let IpAddr::V6(v6) = addr {
        if let Some(mapped) = v6.to_ipv4_mapped() {
            let mapped = IpAddr::V4(mapped);
            return BLOCKED_NETS.iter().find(|net| net.contains(&mapped));
        }
    }
    None
}

/// 校验源站 URL 是否可以安全抓取
///
/// 返回 (是否安全, 原因)。原因串会原样出现在 502 响应体里。
#[must_use]
pub fn is_safe_origin_url(url: &str) -> (bool, String) {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => return (false, format!("invalid url: {e}")),
    };

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return (
            false,
            format!("invalid scheme: {scheme}. Only HTTP/HTTPS allowed"),
        );
    }

    let Some(host) = parsed.host() else {
        return (false, "missing hostname".to_string());
    };

    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return (false, "localhost access not allowed".to_string());
            }
        }
        Host::Ipv4(addr) => {
            if let Some(net) = blocked_net_for(IpAddr::V4(addr)) {
                return (false, format!("address {addr} in blocked range {net}"));
            }
        }
        Host::Ipv6(addr) => {
            if let Some(net) = blocked_net_for(IpAddr::V6(addr)) {
                return (false, format!("address {addr} in blocked range {net}"));
            }
        }
    }

    (true, "OK".to_string())
}
