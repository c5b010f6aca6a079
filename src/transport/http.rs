//! 基于 `reqwest` 的传输实现

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::{HttpResponse, Transport};
use crate::error::{ConfigError, Result, TransportError};

/// 默认请求超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest 传输实现
///
/// 请求地址为 `base_url` 拼接相对路径，请求体以 JSON 发送。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// 使用默认超时创建
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// 使用指定超时创建
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// 使用已有的 `reqwest::Client` 创建
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: e.to_string(),
        })?;

        // 保证 join 时保留原有路径
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// 服务根地址
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(e.to_string()).into())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, path: &str, payload: serde_json::Value) -> Result<HttpResponse> {
        let url = self.endpoint(path)?;

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        tracing::debug!(path, status, "remote auth service responded");
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let transport = ReqwestTransport::new("https://auth.example.com/api").unwrap();
        assert_eq!(transport.base_url().as_str(), "https://auth.example.com/api/");
        assert_eq!(
            transport.endpoint("verify-token").unwrap().as_str(),
            "https://auth.example.com/api/verify-token"
        );
        assert_eq!(
            transport.endpoint("/authenticate").unwrap().as_str(),
            "https://auth.example.com/api/authenticate"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ReqwestTransport::new("not a url").is_err());
    }
}
