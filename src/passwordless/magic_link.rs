//! Magic Link（魔法链接）实现
//!
//! 提供基于签名 token 的无密码登录功能。token 自身携带邮箱和过期时间，
//! 服务端不需要保存任何状态。
//!
//! ## 工作流程
//!
//! 1. 用户输入邮箱请求登录
//! 2. [`MagicLinkAuthenticator::generate_link`] 签发 token 并嵌入 URL
//! 3. [`MagicLinkAuthenticator::send_link`] 通过 [`LinkDelivery`] 投递到用户邮箱
//! 4. 用户点击链接，[`MagicLinkAuthenticator::authenticate_user`] 校验 token
//!    并通过 [`UserDirectory`] 解析用户
//!
//! token 在过期前可以重复使用；需要一次性语义的应用应自行记录已使用的 token。
//!
//! ## 示例
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use passwordless::passwordless::{
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
//!     .generate_link("user@example.com", Duration::from_secs(600))
//!     .unwrap();
//! authenticator.send_link("user@example.com", &link).await.unwrap();
//!
//! let token = authenticator.extract_token(&link).unwrap();
//! let user = authenticator.authenticate_user(&token).await.unwrap().unwrap();
//! assert_eq!(user.id, "u1");
//! # });
//! ```
//!
//! ## 自定义配置
//!
//! ```rust
//! use passwordless::passwordless::{LinkStyle, MagicLinkConfig};
//! use std::time::Duration;
//!
//! let config = MagicLinkConfig::new("https://example.com")
//!     .unwrap()
//!     .with_link_style(LinkStyle::query("auth/verify", "token")) // ?token=...
//!     .with_default_ttl(Duration::from_secs(600))                // 10 分钟过期
//!     .with_issued_at(false);                                    // 不写入 iat
//! ```

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::delivery::LinkDelivery;
use super::directory::{AuthenticatedUser, UserDirectory};
use crate::audit::{AuditLogger, NoOpAuditLogger, SecurityEvent};
use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, Error, Result, TokenError, ValidationError};
use crate::token::{Claims, HmacTokenCodec, TokenCodec};

// ============================================================================
// 配置
// ============================================================================

/// Token 在链接中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStyle {
    /// `{base}/{prefix}/{token}`
    PathSegment {
        /// 路径前缀，可包含多段，如 `auth` 或 `api/auth`
        prefix: String,
    },
    /// `{base}/{path}?{name}={token}`
    QueryParameter {
        /// 路径
        path: String,
        /// 查询参数名
        name: String,
    },
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self::path("auth")
    }
}

impl LinkStyle {
    /// 路径段风格
    pub fn path(prefix: impl Into<String>) -> Self {
        LinkStyle::PathSegment {
            prefix: prefix.into(),
        }
    }

    /// 查询参数风格
    pub fn query(path: impl Into<String>, name: impl Into<String>) -> Self {
        LinkStyle::QueryParameter {
            path: path.into(),
            name: name.into(),
        }
    }

    /// 默认的查询参数风格：`{base}/auth/verify?token={token}`
    pub fn default_query() -> Self {
        Self::query("auth/verify", "token")
    }

    /// 将 token 嵌入基础 URL
    pub fn embed(&self, base: &Url, token: &str) -> Result<Url> {
        let mut url = base.clone();

        {
            let mut segments = url.path_segments_mut().map_err(|_| ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: "URL cannot be a base".to_string(),
            })?;
            segments.pop_if_empty();

            let path = match self {
                LinkStyle::PathSegment { prefix } => prefix,
                LinkStyle::QueryParameter { path, .. } => path,
            };
            for part in split_path(path) {
                segments.push(part);
            }

            if let LinkStyle::PathSegment { .. } = self {
                segments.push(token);
            }
        }

        if let LinkStyle::QueryParameter { name, .. } = self {
            url.query_pairs_mut().append_pair(name, token);
        }

        Ok(url)
    }

    /// 从链接中取出 token
    pub fn extract(&self, link: &Url) -> Option<String> {
        match self {
            LinkStyle::PathSegment { prefix } => {
                let segments: Vec<&str> = link.path_segments()?.collect();
                let prefix: Vec<&str> = split_path(prefix).collect();
                let (token, rest) = segments.split_last()?;

                if token.is_empty() || !rest.ends_with(&prefix) {
                    return None;
                }
                Some((*token).to_string())
            }
            LinkStyle::QueryParameter { name, .. } => link
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty()),
        }
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Magic Link 配置
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// 链接的基础 URL
    pub base_url: Url,

    /// Token 在链接中的位置
    pub link_style: LinkStyle,

    /// [`generate_default_link`](MagicLinkAuthenticator::generate_default_link) 使用的有效期
    pub default_ttl: Duration,

    /// 是否在 token 中写入签发时间
    pub include_issued_at: bool,
}

impl MagicLinkConfig {
    /// 默认有效期：15 分钟
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

    /// 使用基础 URL 创建配置
    ///
    /// # Errors
    ///
    /// URL 无法解析，或者不能作为基础 URL（如 `mailto:`）
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: e.to_string(),
        })?;
        Self::from_url(base_url)
    }

    /// 使用已解析的 URL 创建配置
    pub fn from_url(base_url: Url) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("'{}' cannot be a base URL", base_url),
            }
            .into());
        }

        Ok(Self {
            base_url,
            link_style: LinkStyle::default(),
            default_ttl: Self::DEFAULT_TTL,
            include_issued_at: true,
        })
    }

    /// 设置链接风格
    pub fn with_link_style(mut self, style: LinkStyle) -> Self {
        self.link_style = style;
        self
    }

    /// 设置默认有效期
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// 设置是否写入签发时间
    pub fn with_issued_at(mut self, include: bool) -> Self {
        self.include_issued_at = include;
        self
    }

    /// 高安全性配置
    ///
    /// - 5 分钟过期
    pub fn high_security(base_url: &str) -> Result<Self> {
        Ok(Self::new(base_url)?.with_default_ttl(Duration::from_secs(5 * 60)))
    }

    /// 宽松配置（适用于开发/测试）
    ///
    /// - 1 小时过期
    pub fn relaxed(base_url: &str) -> Result<Self> {
        Ok(Self::new(base_url)?.with_default_ttl(Duration::from_secs(60 * 60)))
    }
}

// ============================================================================
// Magic Link 认证器
// ============================================================================

/// Magic Link 认证器
///
/// 组合 [`TokenCodec`]、[`LinkDelivery`] 和 [`UserDirectory`]。
/// 自身只持有不可变状态，可放入 `Arc` 在多个请求间共享。
///
/// ```rust
/// use passwordless::clock::FixedClock;
/// use passwordless::passwordless::{
///     InMemoryDelivery, InMemoryUserDirectory, MagicLinkAuthenticator, MagicLinkConfig,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(FixedClock::at_timestamp(1_700_000_000));
/// let authenticator = MagicLinkAuthenticator::with_secret(
///     b"my-secret-key-at-least-32-bytes!",
///     InMemoryDelivery::new(),
///     InMemoryUserDirectory::new(),
///     MagicLinkConfig::new("https://example.com").unwrap(),
/// )
/// .unwrap()
/// .with_clock(clock.clone());
///
/// let link = authenticator.generate_link("a@b.com", Duration::from_secs(60)).unwrap();
/// let token = authenticator.extract_token(&link).unwrap();
/// assert!(authenticator.verify_token(&token));
///
/// clock.advance_secs(60);
/// assert!(!authenticator.verify_token(&token));
/// ```
pub struct MagicLinkAuthenticator<D, U, C = HmacTokenCodec> {
    codec: C,
    delivery: D,
    directory: U,
    config: MagicLinkConfig,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
}

impl<D, U> MagicLinkAuthenticator<D, U, HmacTokenCodec>
where
    D: LinkDelivery,
    U: UserDirectory,
{
    /// 使用 HMAC 编解码器和原始密钥创建认证器
    pub fn with_secret(
        secret: &[u8],
        delivery: D,
        directory: U,
        config: MagicLinkConfig,
    ) -> Result<Self> {
        Ok(Self::new(
            HmacTokenCodec::from_secret(secret)?,
            delivery,
            directory,
            config,
        ))
    }
}

impl<D, U, C> MagicLinkAuthenticator<D, U, C>
where
    D: LinkDelivery,
    U: UserDirectory,
    C: TokenCodec,
{
    /// 创建认证器（系统时钟，不记录审计日志）
    pub fn new(codec: C, delivery: D, directory: U, config: MagicLinkConfig) -> Self {
        Self {
            codec,
            delivery,
            directory,
            config,
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoOpAuditLogger),
        }
    }

    /// 设置时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 设置审计日志记录器
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit = logger;
        self
    }

    /// 获取配置
    pub fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// 获取编解码器
    pub fn codec(&self) -> &C {
        &self.codec
    }

    // ========================================================================
    // 签发
    // ========================================================================

    /// 为邮箱生成魔法链接
    ///
    /// 纯计算，不做任何 I/O。
    ///
    /// # Errors
    ///
    /// - `ttl` 为零
    /// - `email` 为空
    pub fn generate_link(&self, email: &str, ttl: Duration) -> Result<Url> {
        self.issue::<()>(email, ttl, None)
    }

    /// 使用配置中的默认有效期生成魔法链接
    pub fn generate_default_link(&self, email: &str) -> Result<Url> {
        self.generate_link(email, self.config.default_ttl)
    }

    /// 生成携带扩展数据的魔法链接
    pub fn generate_link_with_extra<X: Serialize>(
        &self,
        email: &str,
        ttl: Duration,
        extra: X,
    ) -> Result<Url> {
        self.issue(email, ttl, Some(extra))
    }

    fn issue<X: Serialize>(&self, email: &str, ttl: Duration, extra: Option<X>) -> Result<Url> {
        let ttl_secs = ttl_to_seconds(ttl)?;
        let now = self.clock.timestamp();
        let expires_at = now
            .checked_add(ttl_secs)
            .ok_or_else(|| ValidationError::InvalidTtl("expiration overflows".to_string()))?;

        let mut claims = Claims::new(email, expires_at);
        if self.config.include_issued_at {
            claims = claims.issued_at(now);
        }
        claims.extra = extra;

        let token = self.codec.encode(&claims)?;
        let link = self.config.link_style.embed(&self.config.base_url, &token)?;

        tracing::debug!(recipient = email, expires_at, "magic link issued");
        self.audit(SecurityEvent::magic_link_issued(email));

        Ok(link)
    }

    /// 直接编码 Claims
    pub fn encode_token<X: Serialize>(&self, claims: &Claims<X>) -> Result<String> {
        self.codec.encode(claims)
    }

    /// 解码 token，返回精确的失败原因
    ///
    /// 与 [`verify_token`](Self::verify_token) 使用同一套校验逻辑和时钟，
    /// 用于诊断或读取扩展数据。
    pub fn decode_token<X: DeserializeOwned>(&self, token: &str) -> Result<Claims<X>> {
        self.codec.decode_at(token, self.clock.timestamp())
    }

    /// 从链接中取出 token
    pub fn extract_token(&self, link: &Url) -> Option<String> {
        self.config.link_style.extract(link)
    }

    // ========================================================================
    // 投递
    // ========================================================================

    /// 投递魔法链接
    ///
    /// 只调用一次投递接口，不重试。
    ///
    /// # Errors
    ///
    /// - [`Error::DeliveryFailed`]: 投递服务返回失败
    /// - 投递接口自身的错误（如 [`Error::Transport`]）原样返回
    pub async fn send_link(&self, email: &str, link: &Url) -> Result<()> {
        match self.delivery.send(email, link).await {
            Ok(true) => {
                tracing::debug!(recipient = email, "magic link delivered");
                self.audit(SecurityEvent::magic_link_sent(email));
                Ok(())
            }
            Ok(false) => {
                tracing::warn!(recipient = email, "magic link delivery rejected");
                self.audit(SecurityEvent::magic_link_delivery_failed(
                    email,
                    "rejected by delivery service",
                ));
                Err(Error::delivery_failed(format!(
                    "delivery service rejected link for {}",
                    email
                )))
            }
            Err(e) => {
                tracing::warn!(recipient = email, error = %e, "magic link delivery failed");
                self.audit(SecurityEvent::magic_link_delivery_failed(email, e.to_string()));
                Err(e)
            }
        }
    }

    // ========================================================================
    // 校验与认证
    // ========================================================================

    /// 校验 token
    ///
    /// 签名正确且未过期时返回 `true`，其余任何输入都返回 `false`。
    pub fn verify_token(&self, token: &str) -> bool {
        self.check(token).is_ok()
    }

    /// 认证用户（严格模式）
    ///
    /// # Errors
    ///
    /// - [`Error::Token`]: token 格式错误、签名无效或已过期
    /// - [`Error::UserNotFound`]: token 有效但用户不存在
    /// - 用户目录自身的错误
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.check(token)?;
        self.resolve(claims).await
    }

    /// 认证用户
    ///
    /// token 无效、过期或用户不存在时返回 `Ok(None)`；只有用户目录本身出错时才返回 `Err`。
    pub async fn authenticate_user(&self, token: &str) -> Result<Option<AuthenticatedUser>> {
        let Ok(claims) = self.check(token) else {
            return Ok(None);
        };

        match self.resolve(claims).await {
            Ok(user) => Ok(Some(user)),
            Err(Error::UserNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 解码并记录失败原因
    ///
    /// 扩展数据以 `IgnoredAny` 解码，任意扩展数据都不影响校验结果。
    fn check(&self, token: &str) -> Result<Claims<IgnoredAny>> {
        match self.codec.decode_at::<IgnoredAny>(token, self.clock.timestamp()) {
            Ok(claims) => {
                self.audit(SecurityEvent::magic_link_verified(&claims.email));
                Ok(claims)
            }
            Err(e) => {
                match &e {
                    Error::Token(TokenError::Expired) => {
                        tracing::debug!("magic link token expired");
                        self.audit(SecurityEvent::magic_link_expired());
                    }
                    Error::Token(reason) => {
                        tracing::debug!(reason = %reason, "magic link token rejected");
                        self.audit(SecurityEvent::magic_link_rejected(reason.to_string()));
                    }
                    other => {
                        tracing::warn!(error = %other, "magic link token could not be checked");
                        self.audit(SecurityEvent::magic_link_rejected(other.to_string()));
                    }
                }
                Err(e)
            }
        }
    }

    async fn resolve(&self, claims: Claims<IgnoredAny>) -> Result<AuthenticatedUser> {
        match self.directory.lookup(&claims.email).await? {
            Some(record) => {
                tracing::debug!(user_id = %record.id, "magic link authentication succeeded");
                self.audit(SecurityEvent::login_success(&record.id, &claims.email));
                Ok(AuthenticatedUser {
                    id: record.id,
                    email: claims.email,
                })
            }
            None => {
                tracing::debug!(recipient = %claims.email, "no user for magic link email");
                self.audit(SecurityEvent::login_failed(&claims.email, "unknown user"));
                Err(Error::UserNotFound(claims.email))
            }
        }
    }

    fn audit(&self, event: SecurityEvent) {
        self.audit.log(event.with_timestamp(self.clock.now()));
    }
}

/// 有效期换算为秒，不足一秒的部分向上取整
pub(crate) fn ttl_to_seconds(ttl: Duration) -> Result<i64> {
    if ttl.is_zero() {
        return Err(ValidationError::InvalidTtl("ttl must be greater than zero".to_string()).into());
    }

    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    i64::try_from(secs)
        .map_err(|_| ValidationError::InvalidTtl("ttl is too large".to_string()).into())
}
