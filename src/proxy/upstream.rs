//! # 源站客户端
//!
//! reqwest 客户端的薄封装：关闭自动重定向（3xx 由引擎自己拦截），
//! 总超时来自配置，响应体按上限流式读取。

use axum::http::HeaderMap;
use bytes::{Bytes, BytesMut};
use reqwest::Method;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};

/// 源站 HTTP 客户端
#[derive(Clone)]
pub struct OriginClient {
    client: reqwest::Client,
    timeout_secs: u64,
    max_body_bytes: usize,
}

impl OriginClient {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                ProxyError::internal_with_source("failed to build origin http client", e.into())
            })?;

        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
            max_body_bytes: config.max_response_size_mb * 1024 * 1024,
        })
    }

    /// 非媒体响应体的大小上限（字节）
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// 发送一次源站请求
    pub async fn fetch(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        request.send().await.map_err(|e| self.classify_error(e))
    }

    /// 读取整个响应体
    ///
    /// `enforce_cap` 为真时超出上限返回 `OversizeResponse`；媒体内容豁免。
    pub async fn read_body(
        &self,
        mut response: reqwest::Response,
        enforce_cap: bool,
    ) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => return Err(self.classify_error(e)),
            };
            if enforce_cap && buf.len() + chunk.len() > self.max_body_bytes {
                return Err(ProxyError::OversizeResponse {
                    size: buf.len() + chunk.len(),
                    limit: self.max_body_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    fn classify_error(&self, e: reqwest::Error) -> ProxyError {
        if e.is_timeout() {
            ProxyError::OriginTimeout {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_decode() || e.is_body() {
            ProxyError::MalformedResponse {
                message: e.to_string(),
            }
        } else {
            ProxyError::network_with_source("origin fetch failed", e.into())
        }
    }
}
