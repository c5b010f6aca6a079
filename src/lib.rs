//! # Passwordless
//!
//! 基于魔法链接 (Magic Link) 的无密码认证库。
//!
//! ## 功能特性
//!
//! - **签名 Token**: HMAC-SHA256 紧凑格式，常量时间校验签名
//! - **JWT Token**: 可选的标准 JWT 信封格式（HS256/HS384/HS512）
//! - **Magic Link**: 生成、投递、校验魔法链接并解析用户身份
//! - **可注入时钟**: 过期判断可在测试中精确控制
//! - **审计日志**: 记录链接签发、投递和认证事件
//! - **远程服务**: 通过 HTTP 调用独立的认证服务
//!
//! ## Features
//!
//! - `jwt` - 启用 JWT 编解码器（默认启用）
//! - `http` - 启用基于 reqwest 的 HTTP 传输
//! - `full` - 启用所有功能
//!
//! ## 快速开始
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use passwordless::{
//!     InMemoryDelivery, InMemoryUserDirectory, MagicLinkAuthenticator, MagicLinkConfig,
//!     UserRecord,
//! };
//! use std::time::Duration;
//!
//! let directory = InMemoryUserDirectory::new();
//! directory.insert(UserRecord::new("u1", "user@example.com"));
//!
//! let authenticator = MagicLinkAuthenticator::with_secret(
//!     b"my-secret-key-at-least-32-bytes!",
//!     InMemoryDelivery::new(),
//!     directory,
//!     MagicLinkConfig::new("https://example.com").unwrap(),
//! )
//! .unwrap();
//!
//! let link = authenticator
//!     .generate_link("user@example.com", Duration::from_secs(3600))
//!     .unwrap();
//! authenticator.send_link("user@example.com", &link).await.unwrap();
//!
//! let token = authenticator.extract_token(&link).unwrap();
//! assert!(authenticator.verify_token(&token));
//!
//! let user = authenticator.authenticate_user(&token).await.unwrap();
//! assert_eq!(user.unwrap().id, "u1");
//! # });
//! ```
//!
//! ## JWT 编解码器
//!
#![cfg_attr(feature = "jwt", doc = "```rust")]
#![cfg_attr(not(feature = "jwt"), doc = "```rust,ignore")]
//! use passwordless::token::{Claims, JwtAlgorithm, JwtTokenCodec, SigningKey, TokenCodec};
//!
//! let key = SigningKey::new(b"my-secret-key-at-least-32-bytes!").unwrap();
//! let codec = JwtTokenCodec::new(key).with_algorithm(JwtAlgorithm::HS512);
//!
//! let token = codec.encode(&Claims::<()>::new("user@example.com", 1_700_000_900)).unwrap();
//! let claims: Claims = codec.decode_at(&token, 1_700_000_000).unwrap();
//! assert_eq!(claims.email, "user@example.com");
//! ```

pub mod audit;
pub mod clock;
pub mod error;
pub mod passwordless;
pub mod random;
pub mod token;
pub mod transport;

pub use error::{Error, Result};

// ============================================================================
// Token 相关导出
// ============================================================================

pub use token::{Claims, HmacTokenCodec, SigningKey, TokenCodec};
#[cfg(feature = "jwt")]
pub use token::{JwtAlgorithm, JwtTokenCodec};

// ============================================================================
// 无密码认证相关导出
// ============================================================================

pub use passwordless::{
    AuthenticatedUser, InMemoryDelivery, InMemoryUserDirectory, LinkDelivery, LinkStyle,
    LoggingDelivery, MagicLinkAuthenticator, MagicLinkConfig, UserDirectory, UserRecord,
};

// ============================================================================
// 基础设施导出
// ============================================================================

pub use audit::{AuditLogger, InMemoryAuditLogger, SecurityEvent, TracingAuditLogger};
pub use clock::{Clock, FixedClock, SystemClock};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{
    HttpLinkDelivery, HttpResponse, RemoteMagicLinkClient, RemoteUserDirectory, Transport,
};
