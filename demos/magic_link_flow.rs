//! Magic Link 登录流程示例
//!
//! 展示如何签发、投递和校验魔法链接，以及如何接入自定义的投递实现。
//!
//! 运行: cargo run --example magic_link_flow

use async_trait::async_trait;
use passwordless::audit::TracingAuditLogger;
use passwordless::clock::{Clock, FixedClock};
use passwordless::passwordless::{
    InMemoryUserDirectory, LinkDelivery, LinkStyle, MagicLinkAuthenticator, MagicLinkConfig,
    UserRecord,
};
use passwordless::token::{HmacTokenCodec, SigningKey};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// 模拟的邮件服务：把"邮件"保存在内存里
#[derive(Default)]
struct ConsoleMailer {
    inbox: Mutex<Vec<(String, Url)>>,
}

#[async_trait]
impl LinkDelivery for ConsoleMailer {
    async fn send(&self, email: &str, link: &Url) -> passwordless::Result<bool> {
        println!("  📧 发送到 {}: {}", email, link);
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((email.to_string(), link.clone()));
        Ok(true)
    }
}

impl ConsoleMailer {
    fn latest(&self) -> Option<Url> {
        self.inbox.lock().ok()?.last().map(|(_, link)| link.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("passwordless=debug"))
        .init();

    println!("=== Magic Link 登录示例 ===\n");

    // 1. 准备依赖
    let mailer = Arc::new(ConsoleMailer::default());
    let users = InMemoryUserDirectory::new();
    users.insert(UserRecord::new("user_alice", "alice@example.com"));

    let clock = Arc::new(FixedClock::at_timestamp(chrono::Utc::now().timestamp()));
    let config = MagicLinkConfig::new("https://app.example.com")?
        .with_link_style(LinkStyle::query("auth/verify", "token"))
        .with_default_ttl(Duration::from_secs(10 * 60));

    let authenticator = MagicLinkAuthenticator::new(
        HmacTokenCodec::new(SigningKey::generate()?),
        mailer.clone(),
        users,
        config,
    )
    .with_clock(clock.clone())
    .with_audit_logger(Arc::new(TracingAuditLogger::new()));

    // 2. 用户请求登录
    println!("1. 用户请求登录");
    let link = authenticator.generate_default_link("alice@example.com")?;
    authenticator.send_link("alice@example.com", &link).await?;

    // 3. 用户点击链接
    println!("\n2. 用户点击链接");
    let clicked = mailer.latest().ok_or("收件箱为空")?;
    let token = authenticator.extract_token(&clicked).ok_or("链接中没有 token")?;

    match authenticator.authenticate_user(&token).await? {
        Some(user) => println!("  ✅ 登录成功: {} ({})", user.id, user.email),
        None => println!("  ❌ 链接无效"),
    }

    // 4. 诊断信息
    let claims: passwordless::Claims = authenticator.decode_token(&token)?;
    println!(
        "\n3. 剩余有效期: {} 秒",
        claims.remaining_seconds(clock.timestamp())
    );

    // 5. 过期后
    println!("\n4. 11 分钟后再次点击");
    clock.advance_secs(11 * 60);
    println!("  verify_token = {}", authenticator.verify_token(&token));
    if let Err(e) = authenticator.decode_token::<()>(&token) {
        println!("  原因: {}", e);
    }

    Ok(())
}
