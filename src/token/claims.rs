//! 魔法链接 Claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TokenError, ValidationError};

/// 魔法链接 token 携带的声明
///
/// 时间字段均为 Unix 时间戳（秒），与 token 中的 `exp` / `iat` 一致，
/// 因此 `decode(encode(c)) == c` 总是成立。
///
/// `extra` 是调用方自定义的强类型扩展数据，默认 `()` 表示不携带。
///
/// ```rust
/// use passwordless::token::Claims;
///
/// let claims: Claims = Claims::new("user@example.com", 1_700_003_600).issued_at(1_700_000_000);
/// assert_eq!(claims.ttl_seconds(), Some(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "X: Deserialize<'de>"))]
pub struct Claims<X = ()> {
    /// 用户邮箱
    pub email: String,

    /// 过期时间
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// 签发时间
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,

    /// 自定义扩展数据
    ///
    /// 字段存在即为 `Some`，即使其值为 `null`（如 `X = Option<T>`）。
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present",
        bound(deserialize = "X: Deserialize<'de>")
    )]
    pub extra: Option<X>,
}

/// 载荷中出现的字段总是解析为 `Some`，缺失时由 `default` 给出 `None`
pub(crate) fn deserialize_present<'de, D, X>(
    deserializer: D,
) -> std::result::Result<Option<X>, D::Error>
where
    D: Deserializer<'de>,
    X: Deserialize<'de>,
{
    X::deserialize(deserializer).map(Some)
}

impl<X> Claims<X> {
    /// 创建不含扩展数据的 Claims
    pub fn new(email: impl Into<String>, expires_at: i64) -> Self {
        Self {
            email: email.into(),
            expires_at,
            issued_at: None,
            extra: None,
        }
    }

    /// 设置签发时间
    pub fn issued_at(mut self, issued_at: i64) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// 设置扩展数据
    pub fn with_extra(mut self, extra: X) -> Self {
        self.extra = Some(extra);
        self
    }

    /// 在指定时间点是否已过期
    ///
    /// 到达 `exp` 的那一秒即视为过期。
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// 过期时间（UTC）
    pub fn expires_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// 签发时间到过期时间的跨度
    pub fn ttl_seconds(&self) -> Option<i64> {
        self.issued_at.map(|iat| self.expires_at - iat)
    }

    /// 获取剩余有效时间（秒）
    pub fn remaining_seconds(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }

    /// 编码前的校验
    pub(crate) fn validate_for_encoding(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email".to_string()).into());
        }
        Ok(())
    }

    /// 解码后的校验
    ///
    /// 签名已经通过，这里只检查载荷本身是否合法以及是否过期。
    pub(crate) fn validate_decoded(self, now: i64) -> Result<Self> {
        if self.email.trim().is_empty() {
            return Err(TokenError::Malformed("empty email claim".to_string()).into());
        }
        if self.is_expired_at(now) {
            return Err(TokenError::Expired.into());
        }
        Ok(self)
    }
}
