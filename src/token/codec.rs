//! Token 编解码器
//!
//! ## Token 格式
//!
//! [`HmacTokenCodec`] 生成的 token 由两部分组成，使用 `.` 分隔：
//! - Claims 的 JSON 序列化（base64url 编码，无填充）
//! - 对上述 JSON 字节计算的 HMAC-SHA256 签名（base64url 编码，无填充）
//!
//! 结果只包含 `A-Z a-z 0-9 - _ .`，可直接放入 URL 路径或查询参数。
//!
//! ## 校验顺序
//!
//! 解码时先校验签名，签名通过后才反序列化载荷并检查过期时间，
//! 未签名的数据不会被解析。

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;

use super::claims::Claims;
use super::key::SigningKey;
use crate::error::{CryptoError, Error, Result, TokenError};
use crate::random::constant_time_compare;

type HmacSha256 = Hmac<Sha256>;

/// 载荷与签名之间的分隔符
pub const SEGMENT_SEPARATOR: char = '.';

/// Token 编解码器
///
/// 实现必须是无状态的纯函数（仅依赖不可变的密钥），可在多线程中并发调用。
pub trait TokenCodec: Send + Sync {
    /// 将 Claims 编码为签名后的 token
    ///
    /// # Errors
    ///
    /// - `email` 为空
    /// - 序列化失败
    fn encode<X: Serialize>(&self, claims: &Claims<X>) -> Result<String>;

    /// 在指定时间点解码并校验 token
    ///
    /// # Errors
    ///
    /// - [`TokenError::Malformed`]: 无法拆分、无法解码或载荷不合法
    /// - [`TokenError::InvalidSignature`]: 签名不匹配
    /// - [`TokenError::Expired`]: `exp <= now`
    fn decode_at<X: DeserializeOwned>(&self, token: &str, now: i64) -> Result<Claims<X>>;

    /// 使用系统时间解码并校验 token
    fn decode<X: DeserializeOwned>(&self, token: &str) -> Result<Claims<X>> {
        self.decode_at(token, Utc::now().timestamp())
    }
}

/// 基于 HMAC-SHA256 的紧凑 token 编解码器
///
/// ```rust
/// use passwordless::token::{Claims, HmacTokenCodec, SigningKey, TokenCodec};
///
/// let codec = HmacTokenCodec::new(SigningKey::new(b"my-secret-key-at-least-32-bytes!").unwrap());
///
/// let claims: Claims = Claims::new("user@example.com", 4_102_444_800);
/// let token = codec.encode(&claims).unwrap();
/// assert_eq!(token.matches('.').count(), 1);
///
/// let decoded: Claims = codec.decode(&token).unwrap();
/// assert_eq!(decoded, claims);
/// ```
#[derive(Debug, Clone)]
pub struct HmacTokenCodec {
    key: SigningKey,
}

impl HmacTokenCodec {
    /// 使用签名密钥创建编解码器
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// 使用原始密钥字节创建编解码器
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        Ok(Self::new(SigningKey::new(secret)?))
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| Error::Crypto(CryptoError::InvalidKey(e.to_string())))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl TokenCodec for HmacTokenCodec {
    fn encode<X: Serialize>(&self, claims: &Claims<X>) -> Result<String> {
        claims.validate_for_encoding()?;

        let payload = serde_json::to_vec(claims)
            .map_err(|e| TokenError::EncodingFailed(format!("failed to serialize claims: {}", e)))?;
        let signature = self.sign(&payload)?;

        Ok(format!(
            "{}{}{}",
            URL_SAFE_NO_PAD.encode(&payload),
            SEGMENT_SEPARATOR,
            URL_SAFE_NO_PAD.encode(&signature)
        ))
    }

    fn decode_at<X: DeserializeOwned>(&self, token: &str, now: i64) -> Result<Claims<X>> {
        let (payload_b64, signature_b64) = token
            .split_once(SEGMENT_SEPARATOR)
            .ok_or_else(|| Error::malformed("missing segment separator"))?;

        if payload_b64.is_empty() || signature_b64.is_empty() {
            return Err(Error::malformed("empty token segment"));
        }
        if signature_b64.contains(SEGMENT_SEPARATOR) {
            return Err(Error::malformed("unexpected number of segments"));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| Error::malformed(format!("payload is not base64url: {}", e)))?;
        let provided_signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| Error::malformed(format!("signature is not base64url: {}", e)))?;

        let expected_signature = self.sign(&payload)?;
        if !constant_time_compare(&expected_signature, &provided_signature) {
            return Err(TokenError::InvalidSignature.into());
        }

        let claims: Claims<X> = serde_json::from_slice(&payload)
            .map_err(|e| Error::malformed(format!("invalid claims payload: {}", e)))?;

        claims.validate_decoded(now)
    }
}
