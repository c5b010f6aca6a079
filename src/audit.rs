//! 审计日志模块
//!
//! 记录魔法链接生命周期中的安全事件：
//!
//! - **安全事件**: 签发、投递、校验失败、认证成功等
//! - **审计日志 Trait**: 定义记录接口，由应用层接入自己的存储
//! - **内置实现**: 内存实现（测试/开发）、`tracing` 转发实现、空实现
//!
//! 事件中不会出现 token 原文或密钥。
//!
//! ## 使用示例
//!
//! ```rust
//! use passwordless::audit::{AuditLogger, EventSeverity, EventType, InMemoryAuditLogger, SecurityEvent};
//!
//! let logger = InMemoryAuditLogger::new();
//!
//! logger.log(SecurityEvent::magic_link_issued("user@example.com"));
//! logger.log(SecurityEvent::magic_link_rejected("invalid token signature"));
//!
//! assert_eq!(logger.event_count(), 2);
//! assert_eq!(logger.get_events_by_type(&EventType::MagicLinkRejected).len(), 1);
//! assert_eq!(logger.get_events_by_severity(EventSeverity::Warning).len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// 事件严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventSeverity {
    /// 调试信息
    Debug,
    /// 一般信息
    #[default]
    Info,
    /// 警告
    Warning,
    /// 错误
    Error,
}

impl std::fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSeverity::Debug => write!(f, "DEBUG"),
            EventSeverity::Info => write!(f, "INFO"),
            EventSeverity::Warning => write!(f, "WARNING"),
            EventSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// 安全事件类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 魔法链接签发
    MagicLinkIssued,
    /// 魔法链接已投递
    MagicLinkSent,
    /// 魔法链接投递失败
    MagicLinkDeliveryFailed,
    /// 魔法链接校验通过
    MagicLinkVerified,
    /// 魔法链接被拒绝（格式错误或签名无效）
    MagicLinkRejected,
    /// 魔法链接过期
    MagicLinkExpired,
    /// 登录成功
    LoginSuccess,
    /// 登录失败（token 有效但用户不存在）
    LoginFailed,
    /// 自定义事件
    Custom(String),
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::MagicLinkIssued => write!(f, "magic_link_issued"),
            EventType::MagicLinkSent => write!(f, "magic_link_sent"),
            EventType::MagicLinkDeliveryFailed => write!(f, "magic_link_delivery_failed"),
            EventType::MagicLinkVerified => write!(f, "magic_link_verified"),
            EventType::MagicLinkRejected => write!(f, "magic_link_rejected"),
            EventType::MagicLinkExpired => write!(f, "magic_link_expired"),
            EventType::LoginSuccess => write!(f, "login_success"),
            EventType::LoginFailed => write!(f, "login_failed"),
            EventType::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// 安全事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// 事件 ID
    pub id: String,
    /// 事件类型
    pub event_type: EventType,
    /// 严重程度
    pub severity: EventSeverity,
    /// 用户 ID（如果适用）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 事件消息/描述
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 额外详情
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
    /// 事件时间
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// 创建新的安全事件
    pub fn new(event_type: EventType, severity: EventSeverity) -> Self {
        Self {
            id: generate_event_id(),
            event_type,
            severity,
            user_id: None,
            message: None,
            details: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// 创建自定义事件
    pub fn custom(name: impl Into<String>, severity: EventSeverity) -> Self {
        Self::new(EventType::Custom(name.into()), severity)
    }

    // ========================================================================
    // 便捷构造方法
    // ========================================================================

    /// 创建魔法链接签发事件
    pub fn magic_link_issued(recipient: impl Into<String>) -> Self {
        Self::new(EventType::MagicLinkIssued, EventSeverity::Info)
            .with_detail("recipient", recipient.into())
            .with_message("Magic link issued")
    }

    /// 创建魔法链接投递事件
    pub fn magic_link_sent(recipient: impl Into<String>) -> Self {
        Self::new(EventType::MagicLinkSent, EventSeverity::Info)
            .with_detail("recipient", recipient.into())
            .with_message("Magic link sent")
    }

    /// 创建魔法链接投递失败事件
    pub fn magic_link_delivery_failed(
        recipient: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(EventType::MagicLinkDeliveryFailed, EventSeverity::Error)
            .with_detail("recipient", recipient.into())
            .with_message(format!("Magic link delivery failed: {}", reason.into()))
    }

    /// 创建魔法链接校验通过事件
    pub fn magic_link_verified(recipient: impl Into<String>) -> Self {
        Self::new(EventType::MagicLinkVerified, EventSeverity::Info)
            .with_detail("recipient", recipient.into())
            .with_message("Magic link verified")
    }

    /// 创建魔法链接被拒绝事件
    pub fn magic_link_rejected(reason: impl Into<String>) -> Self {
        Self::new(EventType::MagicLinkRejected, EventSeverity::Warning)
            .with_message(format!("Magic link rejected: {}", reason.into()))
    }

    /// 创建魔法链接过期事件
    pub fn magic_link_expired() -> Self {
        Self::new(EventType::MagicLinkExpired, EventSeverity::Info)
            .with_message("Magic link expired")
    }

    /// 创建登录成功事件
    pub fn login_success(user_id: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self::new(EventType::LoginSuccess, EventSeverity::Info)
            .with_user_id(user_id)
            .with_detail("recipient", recipient.into())
            .with_message("User authenticated via magic link")
    }

    /// 创建登录失败事件
    pub fn login_failed(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(EventType::LoginFailed, EventSeverity::Warning)
            .with_detail("recipient", recipient.into())
            .with_message(reason)
    }

    // ========================================================================
    // Builder 方法
    // ========================================================================

    /// 设置用户 ID
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// 设置消息
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 添加详情
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// 设置严重程度
    pub fn with_severity(mut self, severity: EventSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// 设置事件时间
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 获取事件类型名称
    pub fn event_name(&self) -> String {
        self.event_type.to_string()
    }
}

fn generate_event_id() -> String {
    use crate::random::generate_random_hex;
    format!(
        "evt_{}",
        generate_random_hex(16).unwrap_or_else(|_| "unknown".to_string())
    )
}

// ============================================================================
// AuditLogger Trait
// ============================================================================

/// 审计日志记录器 trait
pub trait AuditLogger: Send + Sync {
    /// 记录安全事件
    fn log(&self, event: SecurityEvent);
}

// ============================================================================
// InMemoryAuditLogger
// ============================================================================

/// 内存审计日志记录器
///
/// 用于测试和开发环境，将事件存储在内存中。克隆体共享同一份事件列表。
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditLogger {
    events: Arc<RwLock<Vec<SecurityEvent>>>,
    max_events: Option<usize>,
}

impl InMemoryAuditLogger {
    /// 创建新的内存日志记录器
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带有最大事件数限制的日志记录器
    pub fn with_max_events(max: usize) -> Self {
        Self {
            events: Arc::default(),
            max_events: Some(max),
        }
    }

    /// 获取所有事件
    pub fn get_events(&self) -> Vec<SecurityEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 获取事件数量
    pub fn event_count(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 按事件类型获取事件
    pub fn get_events_by_type(&self, event_type: &EventType) -> Vec<SecurityEvent> {
        self.filter(|e| &e.event_type == event_type)
    }

    /// 按严重程度获取事件
    pub fn get_events_by_severity(&self, severity: EventSeverity) -> Vec<SecurityEvent> {
        self.filter(|e| e.severity == severity)
    }

    /// 按用户 ID 获取事件
    pub fn get_events_by_user(&self, user_id: &str) -> Vec<SecurityEvent> {
        self.filter(|e| e.user_id.as_deref() == Some(user_id))
    }

    /// 清空所有事件
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn filter(&self, predicate: impl Fn(&SecurityEvent) -> bool) -> Vec<SecurityEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}

impl AuditLogger for InMemoryAuditLogger {
    fn log(&self, event: SecurityEvent) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);

        // 超出上限时丢弃最旧的事件
        if let Some(max) = self.max_events {
            while !events.is_empty() && events.len() >= max {
                events.remove(0);
            }
        }

        events.push(event);
    }
}

// ============================================================================
// TracingAuditLogger
// ============================================================================

/// 将审计事件转发到 `tracing`
///
/// 事件以 `target = "passwordless::audit"` 输出，严重程度映射为对应的日志级别。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// 创建新的 tracing 日志记录器
    pub fn new() -> Self {
        Self
    }
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: SecurityEvent) {
        let name = event.event_name();
        let message = event.message.as_deref().unwrap_or_default();
        let user_id = event.user_id.as_deref().unwrap_or_default();
        let recipient = event
            .details
            .get("recipient")
            .map(String::as_str)
            .unwrap_or_default();

        match event.severity {
            EventSeverity::Debug => tracing::debug!(
                target: "passwordless::audit",
                event_id = %event.id, event = %name, user_id, recipient, "{}", message
            ),
            EventSeverity::Info => tracing::info!(
                target: "passwordless::audit",
                event_id = %event.id, event = %name, user_id, recipient, "{}", message
            ),
            EventSeverity::Warning => tracing::warn!(
                target: "passwordless::audit",
                event_id = %event.id, event = %name, user_id, recipient, "{}", message
            ),
            EventSeverity::Error => tracing::error!(
                target: "passwordless::audit",
                event_id = %event.id, event = %name, user_id, recipient, "{}", message
            ),
        }
    }
}

// ============================================================================
// NoOpAuditLogger
// ============================================================================

/// 空操作日志记录器
///
/// 不执行任何操作，用于禁用审计日志
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// 创建新的空操作日志记录器
    pub fn new() -> Self {
        Self
    }
}

impl AuditLogger for NoOpAuditLogger {
    fn log(&self, _event: SecurityEvent) {}
}
