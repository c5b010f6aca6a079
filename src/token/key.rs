//! 签名密钥

use base64::{Engine, engine::general_purpose::STANDARD};
use std::fmt;

use crate::error::{ConfigError, Result};
use crate::random::generate_random_bytes;

/// 签名密钥的最小长度（字节）
pub const MIN_KEY_LENGTH: usize = 32;

/// Token 签名密钥
///
/// 构造后不可变，进程内只读共享。`Debug` 输出不包含密钥内容，且不实现序列化。
///
/// ```rust
/// use passwordless::token::SigningKey;
///
/// let key = SigningKey::new(b"my-secret-key-at-least-32-bytes!").unwrap();
/// assert_eq!(format!("{:?}", key), "SigningKey([REDACTED; 32 bytes])");
///
/// // 太短的密钥会被拒绝
/// assert!(SigningKey::new(b"short").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// 从原始字节创建密钥
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let bytes = bytes.as_ref();
        if bytes.len() < MIN_KEY_LENGTH {
            return Err(ConfigError::InvalidValue {
                key: "signing_key".to_string(),
                message: format!(
                    "key must be at least {} bytes, got {}",
                    MIN_KEY_LENGTH,
                    bytes.len()
                ),
            }
            .into());
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// 随机生成 256 位密钥
    ///
    /// 进程重启后之前签发的 token 将全部失效，多实例部署应使用共享配置。
    pub fn generate() -> Result<Self> {
        Self::new(generate_random_bytes(MIN_KEY_LENGTH)?)
    }

    /// 从标准 Base64 字符串解析密钥
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidValue {
                key: "signing_key".to_string(),
                message: format!("invalid base64: {}", e),
            })?;
        Self::new(bytes)
    }

    /// 从环境变量读取 Base64 编码的密钥
    ///
    /// ```rust,no_run
    /// use passwordless::token::SigningKey;
    ///
    /// let key = SigningKey::from_env("MAGIC_LINK_SECRET").unwrap();
    /// ```
    pub fn from_env(var: &str) -> Result<Self> {
        let value =
            std::env::var(var).map_err(|_| ConfigError::MissingRequired(var.to_string()))?;
        Self::from_base64(&value)
    }

    /// 密钥字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 密钥长度（字节）
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 密钥是否为空（构造时已保证不为空）
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey([REDACTED; {} bytes])", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_key_min_length() {
        assert!(SigningKey::new([0u8; 31]).is_err());
        assert!(SigningKey::new([0u8; 32]).is_ok());
        assert!(SigningKey::new([0u8; 64]).is_ok());
    }

    #[test]
    fn test_generate_is_random() {
        let k1 = SigningKey::generate().unwrap();
        let k2 = SigningKey::generate().unwrap();
        assert_eq!(k1.len(), MIN_KEY_LENGTH);
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_from_base64() {
        let encoded = STANDARD.encode([7u8; 48]);
        let key = SigningKey::from_base64(&format!(" {}\n", encoded)).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; 48]);

        assert!(matches!(
            SigningKey::from_base64("not base64!"),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_from_env_missing() {
        let result = SigningKey::from_env("PASSWORDLESS_TEST_KEY_THAT_IS_NEVER_SET");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingRequired(_)))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SigningKey::new(b"super-secret-material-0123456789").unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
