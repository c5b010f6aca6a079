//! 魔法链接投递
//!
//! 本库不负责实际发送邮件。应用层实现 [`LinkDelivery`]，接入 SendGrid、SES
//! 等服务；HTTP 服务可以直接使用
//! [`HttpLinkDelivery`](crate::transport::HttpLinkDelivery)。

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

use crate::error::Result;

/// 魔法链接投递接口
///
/// 返回 `Ok(true)` 表示投递成功，`Ok(false)` 表示服务方拒绝；
/// 传输失败返回 `Err`。实现方自行决定是否重试。
#[async_trait]
pub trait LinkDelivery: Send + Sync {
    /// 将链接发送给指定邮箱
    async fn send(&self, email: &str, link: &Url) -> Result<bool>;
}

#[async_trait]
impl<T: LinkDelivery + ?Sized> LinkDelivery for Arc<T> {
    async fn send(&self, email: &str, link: &Url) -> Result<bool> {
        (**self).send(email, link).await
    }
}

/// 已投递的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentLink {
    /// 收件人
    pub email: String,
    /// 链接
    pub link: Url,
}

/// 内存投递实现
///
/// 把链接记录在发件箱里而不真正发送，适用于测试环境。
/// 克隆体共享同一个发件箱。
#[derive(Debug, Clone, Default)]
pub struct InMemoryDelivery {
    outbox: Arc<RwLock<Vec<SentLink>>>,
    reject: Arc<RwLock<bool>>,
}

impl InMemoryDelivery {
    /// 创建新的内存投递实现
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置是否拒绝后续投递
    pub fn set_reject(&self, reject: bool) {
        *self.reject.write().unwrap_or_else(PoisonError::into_inner) = reject;
    }

    /// 已投递的所有消息
    pub fn sent(&self) -> Vec<SentLink> {
        self.outbox
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 发给指定邮箱的最后一条链接
    pub fn last_link_for(&self, email: &str) -> Option<Url> {
        self.outbox
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|m| m.email == email)
            .map(|m| m.link.clone())
    }

    /// 已投递的消息数量
    pub fn len(&self) -> usize {
        self.outbox
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 发件箱是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LinkDelivery for InMemoryDelivery {
    async fn send(&self, email: &str, link: &Url) -> Result<bool> {
        if *self.reject.read().unwrap_or_else(PoisonError::into_inner) {
            return Ok(false);
        }

        self.outbox
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentLink {
                email: email.to_string(),
                link: link.clone(),
            });
        Ok(true)
    }
}

/// 仅记录日志的投递实现
///
/// 开发环境使用：通过 `tracing` 输出收件人和链接，并始终返回成功。
/// 链接本身即登录凭证，不要在生产环境启用。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDelivery;

#[async_trait]
impl LinkDelivery for LoggingDelivery {
    async fn send(&self, email: &str, link: &Url) -> Result<bool> {
        tracing::info!(recipient = email, link = %link, "magic link (not delivered)");
        Ok(true)
    }
}
