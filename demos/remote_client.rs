//! 远程认证服务客户端示例
//!
//! 展示如何通过 HTTP 调用独立的认证服务完成魔法链接登录。
//! 需要一个实现了 `send-magic-link` / `verify-token` / `authenticate` 接口的服务。
//!
//! 运行: AUTH_SERVICE_URL=http://localhost:8080 MAGIC_LINK_SECRET=<base64> \
//!       cargo run --example remote_client --features http

use passwordless::token::{HmacTokenCodec, SigningKey};
use passwordless::transport::{RemoteMagicLinkClient, ReqwestTransport};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let service_url =
        std::env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let email = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "alice@example.com".to_string());

    let key = SigningKey::from_env("MAGIC_LINK_SECRET")?;
    let transport = ReqwestTransport::with_timeout(&service_url, Duration::from_secs(10))?;
    let client = RemoteMagicLinkClient::new(transport, HmacTokenCodec::new(key), &service_url)?;

    println!("=== 远程魔法链接客户端 ===\n");

    let link = client.generate_link(&email, Duration::from_secs(15 * 60))?;
    println!("1. 生成链接: {}", link);

    match client.send_link(&email, &link).await {
        Ok(()) => println!("2. 已投递到 {}", email),
        Err(e) => {
            println!("2. 投递失败: {}", e);
            return Ok(());
        }
    }

    let token = client.extract_token(&link).ok_or("链接中没有 token")?;
    println!("3. 远程校验: {}", client.verify_token(&token).await?);

    match client.authenticate_user(&token).await? {
        Some(user) => println!("4. 登录成功: {} ({})", user.id, user.email),
        None => println!("4. 认证服务未返回用户"),
    }

    Ok(())
}
