//! 基于 [`Transport`] 的远程实现

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::{HttpResponse, Transport, paths};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result, TransportError, ValidationError};
use crate::passwordless::magic_link::ttl_to_seconds;
use crate::passwordless::{
    AuthenticatedUser, LinkDelivery, MagicLinkConfig, UserDirectory, UserRecord,
};
use crate::token::{Claims, HmacTokenCodec, TokenCodec};

#[derive(Debug, Deserialize)]
struct SendMagicLinkResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    valid: bool,
}

// ============================================================================
// 投递
// ============================================================================

/// 通过远程服务投递魔法链接
///
/// 非 2xx 响应视为服务方拒绝（`Ok(false)`），2xx 时以响应体中的 `success` 为准。
#[derive(Debug, Clone)]
pub struct HttpLinkDelivery<T> {
    transport: T,
}

impl<T: Transport> HttpLinkDelivery<T> {
    /// 创建投递实现
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> LinkDelivery for HttpLinkDelivery<T> {
    async fn send(&self, email: &str, link: &Url) -> Result<bool> {
        let response = self
            .transport
            .post(
                paths::SEND_MAGIC_LINK,
                json!({ "email": email, "link": link.as_str() }),
            )
            .await?;

        if !response.is_success() {
            tracing::debug!(status = response.status, "send-magic-link returned non-success status");
            return Ok(false);
        }

        Ok(response.json::<SendMagicLinkResponse>()?.success)
    }
}

// ============================================================================
// 用户目录
// ============================================================================

/// 通过远程服务查找用户
///
/// 404 表示用户不存在，其他非 2xx 状态返回 [`TransportError::UnexpectedStatus`]。
#[derive(Debug, Clone)]
pub struct RemoteUserDirectory<T> {
    transport: T,
}

impl<T: Transport> RemoteUserDirectory<T> {
    /// 创建用户目录
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> UserDirectory for RemoteUserDirectory<T> {
    async fn lookup(&self, email: &str) -> Result<Option<UserRecord>> {
        let response = self
            .transport
            .post(paths::LOOKUP_USER, json!({ "email": email }))
            .await?;

        if response.status == 404 {
            return Ok(None);
        }

        Ok(Some(response.error_for_status()?.json()?))
    }
}

// ============================================================================
// 远程客户端
// ============================================================================

/// 远程魔法链接客户端
///
/// 链接在本地签发（`{base}/auth/{token}`），投递、校验和认证都交给远程服务。
///
/// ```rust
/// use passwordless::token::HmacTokenCodec;
/// use passwordless::transport::{HttpResponse, RemoteMagicLinkClient, Transport};
/// use std::time::Duration;
///
/// struct Offline;
///
/// #[async_trait::async_trait]
/// impl Transport for Offline {
///     async fn post(
///         &self,
///         _path: &str,
///         _payload: serde_json::Value,
///     ) -> passwordless::Result<HttpResponse> {
///         Ok(HttpResponse::new(503, ""))
///     }
/// }
///
/// let codec = HmacTokenCodec::from_secret(b"my-secret-key-at-least-32-bytes!").unwrap();
/// let client = RemoteMagicLinkClient::new(Offline, codec, "https://auth.example.com").unwrap();
///
/// let link = client.generate_link("user@example.com", Duration::from_secs(600)).unwrap();
/// assert!(link.as_str().starts_with("https://auth.example.com/auth/"));
/// ```
pub struct RemoteMagicLinkClient<T, C = HmacTokenCodec> {
    transport: T,
    codec: C,
    config: MagicLinkConfig,
    clock: Arc<dyn Clock>,
}

impl<T: Transport, C: TokenCodec> RemoteMagicLinkClient<T, C> {
    /// 创建客户端
    pub fn new(transport: T, codec: C, base_url: &str) -> Result<Self> {
        Ok(Self {
            transport,
            codec,
            config: MagicLinkConfig::new(base_url)?,
            clock: Arc::new(SystemClock),
        })
    }

    /// 设置时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 获取底层传输
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 在本地生成魔法链接
    pub fn generate_link(&self, email: &str, ttl: Duration) -> Result<Url> {
        let expires_at = self
            .clock
            .timestamp()
            .checked_add(ttl_to_seconds(ttl)?)
            .ok_or_else(|| ValidationError::InvalidTtl("expiration overflows".to_string()))?;

        let token = self.codec.encode(&Claims::<()>::new(email, expires_at))?;
        self.config
            .link_style
            .embed(&self.config.base_url, &token)
    }

    /// 从链接中取出 token
    pub fn extract_token(&self, link: &Url) -> Option<String> {
        self.config.link_style.extract(link)
    }

    /// 直接编码 Claims
    pub fn encode_token<X: Serialize>(&self, claims: &Claims<X>) -> Result<String> {
        self.codec.encode(claims)
    }

    /// 在本地解码 token
    pub fn decode_token<X: DeserializeOwned>(&self, token: &str) -> Result<Claims<X>> {
        self.codec.decode_at(token, self.clock.timestamp())
    }

    /// 通过远程服务投递链接
    ///
    /// 服务方拒绝时返回 [`Error::DeliveryFailed`]。
    pub async fn send_link(&self, email: &str, link: &Url) -> Result<()> {
        let delivered = HttpLinkDelivery::new(&self.transport).send(email, link).await?;
        if delivered {
            Ok(())
        } else {
            Err(Error::delivery_failed(format!(
                "remote service rejected link for {}",
                email
            )))
        }
    }

    /// 通过远程服务校验 token
    ///
    /// # Errors
    ///
    /// 非 2xx 响应返回 [`TransportError::UnexpectedStatus`]
    pub async fn verify_token(&self, token: &str) -> Result<bool> {
        let response = self.post_token(paths::VERIFY_TOKEN, token).await?;
        Ok(response.json::<VerifyTokenResponse>()?.valid)
    }

    /// 通过远程服务认证用户
    ///
    /// 先校验 token，无效时返回 `None`；响应体无法解析时同样返回 `None`。
    pub async fn authenticate_user(&self, token: &str) -> Result<Option<AuthenticatedUser>> {
        if !self.verify_token(token).await? {
            return Ok(None);
        }

        let response = self.post_token(paths::AUTHENTICATE, token).await?;
        match response.json::<AuthenticatedUser>() {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "authenticate returned an unreadable body");
                Ok(None)
            }
        }
    }

    async fn post_token(&self, path: &str, token: &str) -> Result<HttpResponse> {
        let response = self
            .transport
            .post(path, json!({ "token": token }))
            .await?;

        if !response.is_success() {
            tracing::debug!(path, status = response.status, "remote call failed");
            return Err(TransportError::UnexpectedStatus(response.status).into());
        }
        Ok(response)
    }
}
