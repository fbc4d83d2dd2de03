//! # 代理引擎
//!
//! 每个镜像请求的状态机：站点解析 → 限流 → 会话 → 源站 URL 构造 →
//! SSRF 校验 → Cookie 罐注入 → 转发 → 重定向拦截 / 改写 / 透传 →
//! Cookie 罐落库 → 响应头清洗 → 访问日志。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_TYPE, COOKIE, EXPIRES, HOST, LOCATION, RETRY_AFTER, SET_COOKIE,
    USER_AGENT,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use uuid::Uuid;

use crate::app::AppContext;
use crate::cookies::{parse_cookie_header, render_cookie_header};
use crate::error::ProxyError;
use crate::logging::{LogComponent, LogStage, ProxyRequestLog, log_proxy_request};
use crate::mapping;
use crate::ratelimit::RateLimitDecision;
use crate::rewrite::{self, RewriteContext};
use crate::security::{SESSION_COOKIE_NAME, is_safe_origin_url};
use crate::sites::{self, EffectiveConfig, SessionMode};
use crate::{ldebug, lwarn};

use super::headers::{build_forward_headers, sanitize_response_headers};

/// 非媒体内容才受大小上限约束；媒体按响应 Content-Type 前缀判断
const MEDIA_CONTENT_TYPE_PREFIXES: &[&str] =
    &["image/", "video/", "audio/", "application/octet-stream"];

/// 会话状态：本次请求使用的会话与是否新铸造
struct SessionState {
    sid: String,
    signed: String,
    newly_minted: bool,
}

/// 处理一个镜像代理请求
pub async fn handle_proxy_request(
    ctx: Arc<AppContext>,
    req: Request,
    client_addr: SocketAddr,
) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let (parts, body) = req.into_parts();
    let method = parts.method;
    let uri = parts.uri;
    let req_headers = parts.headers;

    let mirror_host_raw = req_headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let mirror_host = sites::normalize_host(&mirror_host_raw);
    let user_agent = req_headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let client_ip = resolve_client_ip(
        &req_headers,
        client_addr,
        ctx.config.rate_limit.trust_forwarded_for,
    );

    // SSRF 这类拒绝的访问记录按 WARN 而不是 ERROR
    let security_denial = std::sync::atomic::AtomicBool::new(false);

    // 统一出口：补上限流头与访问日志
    let finish = |mut response: Response,
                  decision: Option<&RateLimitDecision>,
                  origin_url: &str| {
        if let Some(decision) = decision {
            apply_rate_limit_headers(&mut response, decision);
        }
        log_proxy_request(&ProxyRequestLog {
            request_id: &request_id,
            client_ip: &client_ip,
            mirror_host: &mirror_host,
            origin_url,
            status_code: response.status().as_u16(),
            latency_ms: started.elapsed().as_millis() as u64,
            user_agent: &user_agent,
            security_denial: security_denial.load(std::sync::atomic::Ordering::Relaxed),
        });
        response
    };

    // 1. 站点解析：未命中一律 404，限流器此时还未参与
    let site = match sites::find_site_by_host(&ctx.db, &mirror_host).await {
        Ok(Some(site)) => site,
        Ok(None) => {
            lwarn!(
                request_id,
                LogStage::SiteResolve,
                LogComponent::Resolver,
                "no_site",
                &format!("no site configured for host: {mirror_host}")
            );
            let response = error_response(&ProxyError::SiteNotFound {
                host: mirror_host.clone(),
            });
            return finish(response, None, "");
        }
        Err(err) => return finish(error_response(&err), None, ""),
    };

    let global = match sites::load_global_config(&ctx.db).await {
        Ok(global) => global,
        Err(err) => return finish(error_response(&err), None, ""),
    };
    let effective = sites::effective_config(&site, global.as_ref());

    // 2. 限流（关闭时在任何状态改动前放行）
    let decision = ctx.rate_limiter.check(&client_ip);
    if !decision.allowed {
        lwarn!(
            request_id,
            LogStage::RateLimit,
            LogComponent::RateLimiter,
            "rate_limited",
            &format!("rate limit exceeded for {client_ip}")
        );
        let err = ProxyError::RateLimited {
            retry_after_secs: decision.retry_after_secs,
        };
        let mut response = error_response(&err);
        if let Ok(value) = HeaderValue::from_str(&decision.retry_after_secs.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        return finish(response, Some(&decision), "");
    }

    // 3. 会话：cookie_jar 模式下校验或铸造 px_session_id
    let session = derive_session(&ctx, &req_headers, &effective);

    // 4. 源站 URL
    let path_and_query = uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    let Some(origin_url) = mapping::build_origin_url(
        &mirror_host,
        path_and_query,
        &site.mirror_root,
        &site.source_root,
    ) else {
        let response = error_response(&ProxyError::SiteNotFound {
            host: mirror_host.clone(),
        });
        return finish(response, Some(&decision), "");
    };

    // 5. SSRF 防护：任何源站 IO 之前的最后一道闸
    let (safe, reason) = is_safe_origin_url(origin_url.as_str());
    if !safe {
        lwarn!(
            request_id,
            LogStage::UpstreamRequest,
            LogComponent::Engine,
            "ssrf_blocked",
            &format!("unsafe origin url {origin_url}: {reason}")
        );
        security_denial.store(true, std::sync::atomic::Ordering::Relaxed);
        let response = error_response(&ProxyError::unsafe_origin(reason));
        return finish(response, Some(&decision), origin_url.as_str());
    }

    // 6. 转发头 + Cookie 罐注入
    let mut forward_headers = build_forward_headers(
        &req_headers,
        &origin_url,
        &site.mirror_root,
        &site.source_root,
    );

    let origin_host = origin_url.host_str().unwrap_or(&site.source_root).to_string();
    if let Some(session) = &session {
        match ctx
            .cookie_jar
            .get(site.id, &session.sid, &origin_host)
            .await
        {
            Ok(cookies) if !cookies.is_empty() => {
                let header = render_cookie_header(&cookies);
                if let Ok(value) = HeaderValue::from_str(&header) {
                    forward_headers.insert(COOKIE, value);
                }
            }
            Ok(_) => {}
            Err(err) => {
                // 罐读失败不阻断请求，当无 Cookie 处理
                lwarn!(
                    request_id,
                    LogStage::Session,
                    LogComponent::CookieJar,
                    "jar_read_failed",
                    &format!("cookie jar read failed: {err}")
                );
            }
        }
    }

    // 7. 请求体原样转发
    let request_body = match axum::body::to_bytes(body, ctx.origin.max_body_bytes()).await {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => Some(bytes),
        Err(_) => {
            let response = Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::from("request body too large"))
                .unwrap_or_default();
            return finish(response, Some(&decision), origin_url.as_str());
        }
    };

    ldebug!(
        request_id,
        LogStage::UpstreamRequest,
        LogComponent::Upstream,
        "origin_fetch",
        &format!("{method} {origin_url}")
    );

    // 8. 源站抓取（客户端断开时 axum 丢弃本 future，源站请求随之取消）
    let origin_response = match ctx
        .origin
        .fetch(method, origin_url.clone(), forward_headers, request_body)
        .await
    {
        Ok(response) => response,
        Err(err) => return finish(error_response(&err), Some(&decision), origin_url.as_str()),
    };

    let status = origin_response.status();
    let origin_headers = origin_response.headers().clone();
    let set_cookie_lines: Vec<String> = origin_headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect();

    // 9. 重定向拦截：改写 Location，丢弃响应体
    if status.is_redirection() {
        if let Some(location) = origin_headers.get(LOCATION).and_then(|v| v.to_str().ok()) {
            persist_cookies(&ctx, &request_id, site.id, &session, &origin_host, &set_cookie_lines)
                .await;

            let absolute = origin_url
                .join(location)
                .map_or_else(|_| location.to_string(), |u| u.to_string());
            let mirror_location = mapping::map_origin_url_to_mirror(
                &absolute,
                &site.mirror_root,
                &site.source_root,
                &effective,
                &mirror_host,
            );

            let mut builder = Response::builder().status(status);
            if let Some(headers) = builder.headers_mut() {
                if let Ok(value) = HeaderValue::from_str(&mirror_location) {
                    headers.insert(LOCATION, value);
                }
                for name in [CACHE_CONTROL, EXPIRES] {
                    if let Some(value) = origin_headers.get(&name) {
                        headers.insert(name, value.clone());
                    }
                }
            }
            let mut response = builder.body(Body::empty()).unwrap_or_default();
            attach_session_cookie(&ctx, &mut response, &session);
            return finish(response, Some(&decision), origin_url.as_str());
        }
    }

    // 10. 大小上限：仅非媒体内容
    let content_type = origin_headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let is_media_content = MEDIA_CONTENT_TYPE_PREFIXES
        .iter()
        .any(|prefix| content_type.to_ascii_lowercase().starts_with(prefix));

    if !is_media_content {
        if let Some(length) = origin_response.content_length() {
            if length as usize > ctx.origin.max_body_bytes() {
                let err = ProxyError::OversizeResponse {
                    size: length as usize,
                    limit: ctx.origin.max_body_bytes(),
                };
                return finish(error_response(&err), Some(&decision), origin_url.as_str());
            }
        }
    }

    let body_bytes = match ctx.origin.read_body(origin_response, !is_media_content).await {
        Ok(bytes) => bytes,
        Err(err) => return finish(error_response(&err), Some(&decision), origin_url.as_str()),
    };

    // 11. Cookie 罐落库（Set-Cookie 同时从出站响应剥除）
    persist_cookies(&ctx, &request_id, site.id, &session, &origin_host, &set_cookie_lines).await;

    // 12. HTML 走过滤→改写→注入流水线，其余透传
    let out_body: Bytes = if content_type.to_ascii_lowercase().starts_with("text/html") {
        let rewrite_ctx = RewriteContext {
            mirror_host: &mirror_host,
            mirror_root: &site.mirror_root,
            source_root: &site.source_root,
            effective: &effective,
            page_origin_url: &origin_url,
        };
        rewrite::process_html(&body_bytes, &rewrite_ctx).into()
    } else {
        body_bytes
    };

    // 13. 响应组装：清洗后的头 + 新会话 Cookie
    let sanitized = sanitize_response_headers(&origin_headers);
    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        *headers = sanitized;
    }
    let mut response = builder.body(Body::from(out_body)).unwrap_or_default();
    attach_session_cookie(&ctx, &mut response, &session);

    finish(response, Some(&decision), origin_url.as_str())
}

/// cookie_jar 模式下取出或铸造会话
fn derive_session(
    ctx: &AppContext,
    req_headers: &HeaderMap,
    effective: &EffectiveConfig,
) -> Option<SessionState> {
    if effective.session_mode != SessionMode::CookieJar {
        return None;
    }

    let existing_signed = req_headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(parse_cookie_header)
        .and_then(|cookies| cookies.get(SESSION_COOKIE_NAME).cloned());

    if let Some(signed) = existing_signed {
        if let Some(sid) = ctx.sessions.verify(&signed) {
            return Some(SessionState {
                sid,
                signed,
                newly_minted: false,
            });
        }
    }

    let (sid, signed) = ctx.sessions.mint();
    Some(SessionState {
        sid,
        signed,
        newly_minted: true,
    })
}

/// 新铸造的会话附在响应上
fn attach_session_cookie(ctx: &AppContext, response: &mut Response, session: &Option<SessionState>) {
    if let Some(session) = session {
        if session.newly_minted {
            if let Ok(value) = HeaderValue::from_str(&ctx.sessions.cookie_value(&session.signed)) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
    }
}

/// Set-Cookie 落库；失败记日志但不影响已取到的响应
async fn persist_cookies(
    ctx: &AppContext,
    request_id: &str,
    site_id: i32,
    session: &Option<SessionState>,
    origin_host: &str,
    set_cookie_lines: &[String],
) {
    let Some(session) = session else { return };
    if set_cookie_lines.is_empty() {
        return;
    }
    if let Err(err) = ctx
        .cookie_jar
        .store(site_id, &session.sid, origin_host, set_cookie_lines)
        .await
    {
        lwarn!(
            request_id,
            LogStage::Session,
            LogComponent::CookieJar,
            "jar_write_failed",
            &format!("cookie jar write failed: {err}")
        );
    }
}

fn error_response(err: &ProxyError) -> Response {
    Response::builder()
        .status(err.status_code())
        .body(Body::from(err.client_message()))
        .unwrap_or_default()
}

fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
}

/// 限流键：默认取 socket 对端，仅在显式信任时读 X-Forwarded-For 首跳
fn resolve_client_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    peer.ip().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_defaults_to_socket_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let peer: SocketAddr = "198.51.100.7:443".parse().unwrap();

        assert_eq!(resolve_client_ip(&headers, peer, false), "198.51.100.7");
        assert_eq!(resolve_client_ip(&headers, peer, true), "203.0.113.9");
    }
}
