//! 统一错误类型模块
//!
//! 提供 passwordless 库中所有操作的错误类型定义。
//!
//! Token 相关的失败（格式错误、签名无效、已过期）通过 [`TokenError`] 精确区分，
//! 由 [`MagicLinkAuthenticator`](crate::passwordless::MagicLinkAuthenticator)
//! 在对外接口上折叠为布尔值或 `None`。

use std::fmt;

/// passwordless 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// passwordless 库的错误类型
#[derive(Debug)]
pub enum Error {
    /// Token 相关错误
    Token(TokenError),

    /// 验证错误
    Validation(ValidationError),

    /// 配置错误
    Config(ConfigError),

    /// 加密错误
    Crypto(CryptoError),

    /// 传输层错误
    Transport(TransportError),

    /// 魔法链接投递失败
    DeliveryFailed(String),

    /// 用户不存在
    UserNotFound(String),
}

impl Error {
    /// 创建一个格式错误的 token 错误
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Token(TokenError::Malformed(msg.into()))
    }

    /// 创建一个投递失败错误
    pub fn delivery_failed(msg: impl Into<String>) -> Self {
        Error::DeliveryFailed(msg.into())
    }

    /// 是否为 token 解码/校验失败
    pub fn is_token_error(&self) -> bool {
        matches!(self, Error::Token(_))
    }

    /// 是否为 token 过期
    pub fn is_expired(&self) -> bool {
        matches!(self, Error::Token(TokenError::Expired))
    }
}

/// Token 相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token 已过期
    Expired,
    /// Token 格式无效（无法拆分、无法解码或缺少必需字段）
    Malformed(String),
    /// Token 签名无效
    InvalidSignature,
    /// Token 编码失败
    EncodingFailed(String),
}

/// 验证相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 字段为空
    EmptyField(String),
    /// 无效的有效期
    InvalidTtl(String),
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 缺少必需的配置
    MissingRequired(String),
    /// 无效的配置值
    InvalidValue { key: String, message: String },
}

/// 加密相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 随机数生成失败
    RngFailed(String),
    /// 密钥无效
    InvalidKey(String),
}

/// 传输层相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 请求发送失败（网络错误、连接超时等）
    Request(String),
    /// 非预期的 HTTP 状态码
    UnexpectedStatus(u16),
    /// 无法解析的响应体
    InvalidResponse(String),
    /// 无效的请求地址
    InvalidUrl(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Token(e) => write!(f, "Token error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::DeliveryFailed(msg) => write!(f, "Delivery failed: {}", msg),
            Error::UserNotFound(email) => write!(f, "User not found: {}", email),
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Malformed(msg) => write!(f, "malformed token: {}", msg),
            TokenError::InvalidSignature => write!(f, "invalid token signature"),
            TokenError::EncodingFailed(msg) => write!(f, "token encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "field '{}' cannot be empty", field),
            ValidationError::InvalidTtl(msg) => write!(f, "invalid ttl: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(key) => {
                write!(f, "missing required configuration: {}", key)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "invalid configuration value for '{}': {}", key, message)
            }
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RngFailed(msg) => write!(f, "random number generation failed: {}", msg),
            CryptoError::InvalidKey(msg) => write!(f, "invalid key: {}", msg),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(msg) => write!(f, "request failed: {}", msg),
            TransportError::UnexpectedStatus(status) => {
                write!(f, "unexpected status code: {}", status)
            }
            TransportError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            TransportError::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Token(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Crypto(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::DeliveryFailed(_) | Error::UserNotFound(_) => None,
        }
    }
}

impl std::error::Error for TokenError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for CryptoError {}
impl std::error::Error for TransportError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        Error::Token(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Token(TokenError::InvalidSignature);
        assert_eq!(err.to_string(), "Token error: invalid token signature");
    }

    #[test]
    fn test_error_from_token_error() {
        let err: Error = TokenError::Expired.into();
        assert!(err.is_token_error());
        assert!(err.is_expired());
    }

    #[test]
    fn test_malformed_helper() {
        let err = Error::malformed("missing separator");
        assert!(matches!(
            err,
            Error::Token(TokenError::Malformed(ref msg)) if msg == "missing separator"
        ));
        assert!(!err.is_expired());
    }

    #[test]
    fn test_transport_error_display() {
        let err: Error = TransportError::UnexpectedStatus(502).into();
        assert_eq!(
            err.to_string(),
            "Transport error: unexpected status code: 502"
        );
    }

    #[test]
    fn test_error_source() {
        use std::error::Error as _;

        let err: Error = TokenError::Expired.into();
        assert!(err.source().is_some());

        let err = Error::delivery_failed("provider rejected");
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "Delivery failed: provider rejected");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "field 'email' cannot be empty");
    }
}
