//! # 管理后台会话
//!
//! 环境超级管理员 + HS256 签名的会话 Cookie。

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};

/// 管理会话 Cookie 名
pub const ADMIN_SESSION_COOKIE: &str = "admin_session";

/// 会话有效期：24 小时
const SESSION_EXPIRE_SECS: i64 = 24 * 60 * 60;

/// 会话令牌声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// 用户名
    pub sub: String,
    /// 角色（"superadmin" / "admin" / "viewer"）
    pub role: String,
    /// 过期时间（Unix 秒）
    pub exp: i64,
}

/// 管理后台认证器
#[derive(Clone)]
pub struct AdminAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    superadmin_username: String,
    superadmin_password: String,
}

impl AdminAuth {
    #[must_use]
    pub fn new(secret: &str, username: String, password: String) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 30;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            superadmin_username: username,
            superadmin_password: password,
        }
    }

    /// 校验环境超级管理员的凭据
    #[must_use]
    pub fn verify_superadmin(&self, username: &str, password: &str) -> bool {
        username == self.superadmin_username && password == self.superadmin_password
    }

    /// 签发会话令牌
    pub fn create_session_token(&self, username: &str, role: &str) -> Result<String> {
        let claims = AdminClaims {
            sub: username.to_string(),
            role: role.to_string(),
            exp: chrono::Utc::now().timestamp() + SESSION_EXPIRE_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ProxyError::auth(format!("token generation failed: {e}")))
    }

    /// 校验会话令牌，无效或过期返回 None
    #[must_use]
    pub fn verify_session_token(&self, token: &str) -> Option<AdminClaims> {
        decode::<AdminClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }

    /// 渲染会话 Cookie
    #[must_use]
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{ADMIN_SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={SESSION_EXPIRE_SECS}; SameSite=Lax"
        )
    }

    /// 渲染清除会话的 Cookie
    #[must_use]
    pub fn clear_cookie(&self) -> String {
        format!("{ADMIN_SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AdminAuth {
        AdminAuth::new("secret", "admin".to_string(), "admin123".to_string())
    }

    #[test]
    fn superadmin_credentials_check() {
        let auth = auth();
        assert!(auth.verify_superadmin("admin", "admin123"));
        assert!(!auth.verify_superadmin("admin", "wrong"));
        assert!(!auth.verify_superadmin("root", "admin123"));
    }

    #[test]
    fn session_token_round_trip() {
        let auth = auth();
        let token = auth.create_session_token("admin", "superadmin").unwrap();
        let claims = auth.verify_session_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, "superadmin");
    }

    #[test]
    fn foreign_token_is_rejected() {
        let auth_a = auth();
        let auth_b = AdminAuth::new("other-secret", "admin".to_string(), "x".to_string());
        let token = auth_a.create_session_token("admin", "superadmin").unwrap();
        assert!(auth_b.verify_session_token(&token).is_none());
        assert!(auth_a.verify_session_token("garbage").is_none());
    }
}
