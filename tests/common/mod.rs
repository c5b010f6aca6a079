//! 集成测试共享工具

#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use passwordless::transport::{HttpResponse, Transport};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// 测试用密钥
pub const TEST_SECRET: &[u8] = b"integration-secret-key-32-bytes!!";

/// 固定的测试时间点
pub const T: i64 = 1_700_000_000;

/// 初始化测试日志
///
/// 日志级别依次取 `TEST_LOG`、`RUST_LOG`，默认 `warn`。可重复调用。
pub fn init_logging() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// 按路径返回预设响应并记录请求的传输实现
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置某个路径的响应
    pub fn respond(&self, path: &str, status: u16, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), HttpResponse::json_body(status, &body));
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }

    /// 已收到请求的路径
    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|(path, _)| path).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> passwordless::Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), payload));
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(500, "")))
    }
}
