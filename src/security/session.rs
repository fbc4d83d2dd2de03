//! # 会话标识签名
//!
//! 128 位随机会话标识，HMAC-SHA256 签名后放进 `px_session_id` Cookie。
//! 签名形式为 `<sid>.<base64url(mac)>`，校验走常数时间比较。

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 会话 Cookie 名
pub const SESSION_COOKIE_NAME: &str = "px_session_id";

/// 会话 Cookie 有效期：30 天
pub const SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// 会话标识编解码器
///
/// 密钥在启动时从配置读入；换密钥会使所有已发会话失效。
#[derive(Clone)]
pub struct SessionCodec {
    secret: Vec<u8>,
}

impl SessionCodec {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    /// 生成 128 位随机会话标识（hex 编码）
    #[must_use]
    pub fn generate_sid(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// 签名：`sid.base64url(HMAC-SHA256(secret, sid))`
    #[must_use]
    pub fn sign(&self, sid: &str) -> String {
        let mut mac = self.mac();
        mac.update(sid.as_bytes());
        let tag = mac.finalize().into_bytes();
        format!("{sid}.{}", URL_SAFE_NO_PAD.encode(tag))
    }

    /// 校验签名形式，成功时返回原始 sid
    #[must_use]
    pub fn verify(&self, signed: &str) -> Option<String> {
        let (sid, tag_b64) = signed.rsplit_once('.')?;
        if sid.is_empty() {
            return None;
        }
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
        let mut mac = self.mac();
        mac.update(sid.as_bytes());
        // verify_slice 内部是常数时间比较
        mac.verify_slice(&tag).ok()?;
        Some(sid.to_string())
    }

    /// 铸造一个新会话：返回 (sid, 签名形式)
    #[must_use]
    pub fn mint(&self) -> (String, String) {
        let sid = self.generate_sid();
        let signed = self.sign(&sid);
        (sid, signed)
    }

    /// 渲染发给客户端的 Set-Cookie 值
    #[must_use]
    pub fn cookie_value(&self, signed: &str) -> String {
        format!(
            "{SESSION_COOKIE_NAME}={signed}; HttpOnly; Path=/; Max-Age={SESSION_MAX_AGE_SECS}; SameSite=Lax"
        )
    }
}
