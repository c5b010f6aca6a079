//! Token 模块
//!
//! 提供魔法链接 token 的签名编码与校验解码。
//!
//! ## 子模块
//!
//! - **claims**: token 携带的声明
//! - **key**: 签名密钥
//! - **codec**: [`TokenCodec`] trait 与默认的 HMAC-SHA256 紧凑格式实现
//! - **jwt**: 标准 JWT 信封格式实现（需启用 `jwt` feature）
//!
//! ## 示例
//!
//! ```rust
//! use passwordless::token::{Claims, HmacTokenCodec, SigningKey, TokenCodec};
//! use passwordless::error::{Error, TokenError};
//!
//! let codec = HmacTokenCodec::new(SigningKey::new(b"my-secret-key-at-least-32-bytes!").unwrap());
//! let now = 1_700_000_000;
//!
//! let token = codec
//!     .encode(&Claims::<()>::new("user@example.com", now + 900).issued_at(now))
//!     .unwrap();
//!
//! // 有效期内
//! let claims: Claims = codec.decode_at(&token, now + 60).unwrap();
//! assert_eq!(claims.email, "user@example.com");
//!
//! // 过期后
//! let err = codec.decode_at::<()>(&token, now + 900).unwrap_err();
//! assert!(matches!(err, Error::Token(TokenError::Expired)));
//! ```

pub mod claims;
pub mod codec;
#[cfg(feature = "jwt")]
pub mod jwt;
pub mod key;

pub use claims::Claims;
pub use codec::{HmacTokenCodec, TokenCodec};
#[cfg(feature = "jwt")]
pub use jwt::{JwtAlgorithm, JwtTokenCodec};
pub use key::SigningKey;
