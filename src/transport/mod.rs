//! 远程认证服务绑定
//!
//! 当邮件投递和用户存储由独立的认证服务负责时，通过 [`Transport`]
//! 以 JSON over HTTP 的方式调用它。
//!
//! ## 接口约定
//!
//! | 路径 | 请求 | 响应 |
//! |------|------|------|
//! | `send-magic-link` | `{"email", "link"}` | `{"success": bool}` |
//! | `lookup-user` | `{"email"}` | `{"id", "email"}`，不存在时 404 |
//! | `verify-token` | `{"token"}` | `{"valid": bool}` |
//! | `authenticate` | `{"token"}` | `{"id", "email"}` |
//!
//! ## 子模块
//!
//! - **remote**: 基于 [`Transport`] 的投递、用户目录和客户端实现
//! - **http**: 基于 `reqwest` 的 [`Transport`] 实现（需启用 `http` feature）

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::{Result, TransportError};

#[cfg(feature = "http")]
pub mod http;
pub mod remote;

#[cfg(feature = "http")]
pub use http::ReqwestTransport;
pub use remote::{HttpLinkDelivery, RemoteMagicLinkClient, RemoteUserDirectory};

/// 请求路径
pub mod paths {
    /// 投递魔法链接
    pub const SEND_MAGIC_LINK: &str = "send-magic-link";
    /// 按邮箱查找用户
    pub const LOOKUP_USER: &str = "lookup-user";
    /// 校验 token
    pub const VERIFY_TOKEN: &str = "verify-token";
    /// 用 token 换取用户身份
    pub const AUTHENTICATE: &str = "authenticate";
}

/// HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// 状态码
    pub status: u16,
    /// 响应体
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// 创建响应
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 以 JSON 值创建响应
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// 状态码是否为 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 将响应体解析为 JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()).into())
    }

    /// 非 2xx 时返回 [`TransportError::UnexpectedStatus`]
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::UnexpectedStatus(self.status).into())
        }
    }
}

/// 传输层接口
///
/// `path` 是相对于服务根地址的路径，`payload` 以 JSON 发送。
/// 非 2xx 响应不是错误，由调用方按接口约定解释。
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送 POST 请求
    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<HttpResponse> {
        (**self).post(path, payload).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<HttpResponse> {
        (**self).post(path, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Valid {
        valid: bool,
    }

    #[test]
    fn test_is_success() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn test_json() {
        let response = HttpResponse::json_body(200, &serde_json::json!({ "valid": true }));
        let parsed: Valid = response.json().unwrap();
        assert!(parsed.valid);

        let broken = HttpResponse::new(200, "not json");
        assert!(matches!(
            broken.json::<Valid>(),
            Err(Error::Transport(TransportError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn test_error_for_status() {
        assert!(HttpResponse::new(200, "").error_for_status().is_ok());
        assert!(matches!(
            HttpResponse::new(503, "").error_for_status(),
            Err(Error::Transport(TransportError::UnexpectedStatus(503)))
        ));
    }
}
