//! JWT 信封格式的编解码器
//!
//! 与 [`HmacTokenCodec`](super::HmacTokenCodec) 相同的 Claims，使用标准 JWT
//! （`header.payload.signature`）承载，便于与其他语言的服务端互通。
//!
//! ## 支持的算法
//!
//! - **HS256**: HMAC-SHA256（默认）
//! - **HS384**: HMAC-SHA384
//! - **HS512**: HMAC-SHA512
//!
//! ## 示例
//!
//! ```rust
//! use passwordless::token::{Claims, JwtTokenCodec, SigningKey, TokenCodec};
//!
//! let codec = JwtTokenCodec::new(SigningKey::new(b"my-secret-key-at-least-32-bytes!").unwrap());
//!
//! let claims: Claims = Claims::new("user@example.com", 4_102_444_800);
//! let token = codec.encode(&claims).unwrap();
//! assert_eq!(token.matches('.').count(), 2);
//!
//! let decoded: Claims = codec.decode(&token).unwrap();
//! assert_eq!(decoded.email, "user@example.com");
//! ```

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use std::fmt;

use super::claims::{Claims, deserialize_present};
use super::codec::TokenCodec;
use super::key::SigningKey;
use crate::error::{Error, Result, TokenError};

/// 魔法链接 JWT 的 `sub` 固定值
pub const MAGIC_LINK_SUBJECT: &str = "magic-link";

/// JWT 签名算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JwtAlgorithm {
    /// HMAC-SHA256（默认）
    #[default]
    HS256,
    /// HMAC-SHA384
    HS384,
    /// HMAC-SHA512
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

#[derive(Serialize)]
struct OutgoingPayload<'a, X> {
    sub: &'static str,
    email: &'a str,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<&'a X>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "X: Deserialize<'de>"))]
struct IncomingPayload<X> {
    email: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        bound(deserialize = "X: Deserialize<'de>")
    )]
    extra: Option<X>,
}

/// 基于 JWT 的 token 编解码器
///
/// 过期校验由本编解码器根据传入的 `now` 完成，不使用 `jsonwebtoken` 内置的
/// 系统时间校验，保证与 [`HmacTokenCodec`](super::HmacTokenCodec) 语义一致。
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: JwtAlgorithm,
}

impl JwtTokenCodec {
    /// 使用签名密钥创建编解码器（HS256）
    pub fn new(key: SigningKey) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            algorithm: JwtAlgorithm::default(),
        }
    }

    /// 设置算法
    pub fn with_algorithm(mut self, algorithm: JwtAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// 当前算法
    pub fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    fn build_validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm.into());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.sub = Some(MAGIC_LINK_SUBJECT.to_string());
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);
        validation
    }
}

impl fmt::Debug for JwtTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for JwtTokenCodec {
    fn encode<X: Serialize>(&self, claims: &Claims<X>) -> Result<String> {
        claims.validate_for_encoding()?;

        let payload = OutgoingPayload {
            sub: MAGIC_LINK_SUBJECT,
            email: &claims.email,
            exp: claims.expires_at,
            iat: claims.issued_at,
            extra: claims.extra.as_ref(),
        };

        encode(&Header::new(self.algorithm.into()), &payload, &self.encoding_key).map_err(|e| {
            Error::Token(TokenError::EncodingFailed(format!(
                "failed to encode JWT: {}",
                e
            )))
        })
    }

    fn decode_at<X: DeserializeOwned>(&self, token: &str, now: i64) -> Result<Claims<X>> {
        let data = decode::<IncomingPayload<X>>(token, &self.decoding_key, &self.build_validation())
            .map_err(|e| {
                let error = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::InvalidSignature
                    | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                        TokenError::InvalidSignature
                    }
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed(e.to_string()),
                };
                Error::Token(error)
            })?;

        let payload = data.claims;
        let claims = Claims {
            email: payload.email,
            expires_at: payload.exp,
            issued_at: payload.iat,
            extra: payload.extra,
        };

        claims.validate_decoded(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const TEST_SECRET: &[u8] = b"test-secret-key-at-least-32-bytes!";

    fn codec() -> JwtTokenCodec {
        JwtTokenCodec::new(SigningKey::new(TEST_SECRET).unwrap())
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Invite {
        team: String,
    }

    #[test]
    fn test_jwt_roundtrip() {
        let claims: Claims = Claims::new("user@example.com", now() + 600).issued_at(now());
        let token = codec().encode(&claims).unwrap();

        let decoded: Claims = codec().decode_at(&token, now()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_jwt_roundtrip_with_extra() {
        let claims = Claims::new("user@example.com", now() + 600).with_extra(Invite {
            team: "core".to_string(),
        });
        let token = codec().encode(&claims).unwrap();

        let decoded: Claims<Invite> = codec().decode_at(&token, now()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_jwt_roundtrip_with_null_extra() {
        let claims: Claims<Option<Invite>> =
            Claims::new("user@example.com", now() + 600).with_extra(None);
        let token = codec().encode(&claims).unwrap();

        let decoded: Claims<Option<Invite>> = codec().decode_at(&token, now()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_jwt_expiry_uses_supplied_time() {
        let exp = 2_000_000_000;
        let claims: Claims = Claims::new("user@example.com", exp);
        let token = codec().encode(&claims).unwrap();

        assert!(codec().decode_at::<()>(&token, exp - 1).is_ok());
        assert!(matches!(
            codec().decode_at::<()>(&token, exp),
            Err(Error::Token(TokenError::Expired))
        ));
    }

    #[test]
    fn test_jwt_wrong_key() {
        let claims: Claims = Claims::new("user@example.com", now() + 600);
        let token = codec().encode(&claims).unwrap();

        let other = JwtTokenCodec::new(
            SigningKey::new(b"another-secret-key-at-least-32-bytes").unwrap(),
        );
        assert!(matches!(
            other.decode_at::<()>(&token, now()),
            Err(Error::Token(TokenError::InvalidSignature))
        ));
    }

    #[test]
    fn test_jwt_algorithm_pinned() {
        let claims: Claims = Claims::new("user@example.com", now() + 600);
        let token = codec()
            .with_algorithm(JwtAlgorithm::HS512)
            .encode(&claims)
            .unwrap();

        // HS256 解码器拒绝 HS512 token
        assert!(matches!(
            codec().decode_at::<()>(&token, now()),
            Err(Error::Token(TokenError::InvalidSignature))
        ));

        let hs512 = codec().with_algorithm(JwtAlgorithm::HS512);
        assert!(hs512.decode_at::<()>(&token, now()).is_ok());
    }

    #[test]
    fn test_jwt_malformed() {
        for token in ["", "abc", "a.b", "a.b.c"] {
            assert!(matches!(
                codec().decode_at::<()>(token, now()),
                Err(Error::Token(TokenError::Malformed(_)))
            ));
        }
    }

    #[test]
    fn test_jwt_missing_exp_is_malformed() {
        #[derive(Serialize)]
        struct NoExp<'a> {
            sub: &'a str,
            email: &'a str,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExp {
                sub: MAGIC_LINK_SUBJECT,
                email: "user@example.com",
            },
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        assert!(matches!(
            codec().decode_at::<()>(&token, now()),
            Err(Error::Token(TokenError::Malformed(_)))
        ));
    }

    #[test]
    fn test_jwt_foreign_subject_rejected() {
        #[derive(Serialize)]
        struct Foreign<'a> {
            sub: &'a str,
            email: &'a str,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &Foreign {
                sub: "access-token",
                email: "user@example.com",
                exp: now() + 600,
            },
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        assert!(codec().decode_at::<()>(&token, now()).is_err());
    }
}
