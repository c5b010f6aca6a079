//! 无密码认证模块
//!
//! 提供基于魔法链接 (Magic Link) 的无密码登录。
//!
//! ## 功能特性
//!
//! - **Magic Link**: 签发自包含的签名链接，无需服务端存储
//! - **投递接口**: [`LinkDelivery`]，由应用层接入邮件服务
//! - **用户目录**: [`UserDirectory`]，由应用层接入用户存储
//!
//! ## 设计原则
//!
//! 本模块只负责链接的签发和校验逻辑，**不包含**实际的邮件发送和用户存储。
//! 内存实现（[`InMemoryDelivery`]、[`InMemoryUserDirectory`]）用于测试和单机部署。
//!
//! ## 示例
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use passwordless::passwordless::{
//!     InMemoryDelivery, InMemoryUserDirectory, MagicLinkAuthenticator, MagicLinkConfig,
//! };
//!
//! let delivery = InMemoryDelivery::new();
//! let authenticator = MagicLinkAuthenticator::with_secret(
//!     b"my-secret-key-at-least-32-bytes!",
//!     delivery.clone(),
//!     InMemoryUserDirectory::new().with_auto_create(true),
//!     MagicLinkConfig::new("https://example.com").unwrap(),
//! )
//! .unwrap();
//!
//! // 签发并投递
//! let link = authenticator.generate_default_link("user@example.com").unwrap();
//! authenticator.send_link("user@example.com", &link).await.unwrap();
//!
//! // 用户点击链接
//! let clicked = delivery.last_link_for("user@example.com").unwrap();
//! let token = authenticator.extract_token(&clicked).unwrap();
//! match authenticator.authenticate_user(&token).await.unwrap() {
//!     Some(user) => println!("验证成功，用户: {}", user.id),
//!     None => println!("链接无效或已过期"),
//! }
//! # });
//! ```

pub mod delivery;
pub mod directory;
pub mod magic_link;

pub use delivery::{InMemoryDelivery, LinkDelivery, LoggingDelivery, SentLink};
pub use directory::{AuthenticatedUser, InMemoryUserDirectory, UserDirectory, UserRecord};
pub use magic_link::{LinkStyle, MagicLinkAuthenticator, MagicLinkConfig};
