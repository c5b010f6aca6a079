//! 集成测试：远程认证服务绑定
//!
//! 使用模拟传输测试状态码映射和请求格式。

mod common;

use common::{MockTransport, T, TEST_SECRET};
use passwordless::clock::FixedClock;
use passwordless::error::{Error, TransportError};
use passwordless::passwordless::{
    InMemoryUserDirectory, LinkDelivery, MagicLinkAuthenticator, MagicLinkConfig, UserDirectory,
    UserRecord,
};
use passwordless::token::HmacTokenCodec;
use passwordless::transport::{
    HttpLinkDelivery, RemoteMagicLinkClient, RemoteUserDirectory, paths,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn link() -> Url {
    Url::parse("https://example.com/auth/abc.def").unwrap()
}

/// 测试投递请求格式和响应解析
#[tokio::test]
async fn test_http_delivery() {
    common::init_logging();
    let transport = Arc::new(MockTransport::new());
    let delivery = HttpLinkDelivery::new(transport.clone());

    transport.respond(paths::SEND_MAGIC_LINK, 200, json!({ "success": true }));
    assert!(delivery.send("a@b.com", &link()).await.unwrap());

    transport.respond(paths::SEND_MAGIC_LINK, 200, json!({ "success": false }));
    assert!(!delivery.send("a@b.com", &link()).await.unwrap());

    transport.respond(paths::SEND_MAGIC_LINK, 400, json!({ "error": "bad email" }));
    assert!(!delivery.send("a@b.com", &link()).await.unwrap());

    let requests = transport.requests();
    let (path, payload) = &requests[0];
    assert_eq!(path, "send-magic-link");
    assert_eq!(payload["email"], "a@b.com");
    assert_eq!(payload["link"], "https://example.com/auth/abc.def");
}

/// 测试远程用户目录的状态码映射
#[tokio::test]
async fn test_remote_directory() {
    let transport = Arc::new(MockTransport::new());
    let directory = RemoteUserDirectory::new(transport.clone());

    transport.respond(paths::LOOKUP_USER, 200, json!({ "id": "u1", "email": "a@b.com" }));
    assert_eq!(
        directory.lookup("a@b.com").await.unwrap(),
        Some(UserRecord::new("u1", "a@b.com"))
    );

    transport.respond(paths::LOOKUP_USER, 404, json!({}));
    assert_eq!(directory.lookup("a@b.com").await.unwrap(), None);

    transport.respond(paths::LOOKUP_USER, 503, json!({}));
    assert!(matches!(
        directory.lookup("a@b.com").await,
        Err(Error::Transport(TransportError::UnexpectedStatus(503)))
    ));

    transport.respond(paths::LOOKUP_USER, 200, json!({ "unexpected": true }));
    assert!(matches!(
        directory.lookup("a@b.com").await,
        Err(Error::Transport(TransportError::InvalidResponse(_)))
    ));
}

/// 测试本地认证器搭配远程协作方
#[tokio::test]
async fn test_authenticator_with_remote_collaborators() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(paths::SEND_MAGIC_LINK, 200, json!({ "success": true }));
    transport.respond(paths::LOOKUP_USER, 200, json!({ "id": "u1", "email": "a@b.com" }));

    let authenticator = MagicLinkAuthenticator::with_secret(
        TEST_SECRET,
        HttpLinkDelivery::new(transport.clone()),
        RemoteUserDirectory::new(transport.clone()),
        MagicLinkConfig::new("https://example.com").unwrap(),
    )
    .unwrap();

    let link = authenticator.generate_default_link("a@b.com").unwrap();
    authenticator.send_link("a@b.com", &link).await.unwrap();

    let token = authenticator.extract_token(&link).unwrap();
    let user = authenticator.authenticate_user(&token).await.unwrap().unwrap();
    assert_eq!(user.id, "u1");

    assert_eq!(transport.paths(), vec!["send-magic-link", "lookup-user"]);
}

/// 测试用户目录出错时错误向上传递
#[tokio::test]
async fn test_directory_error_propagates() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(paths::LOOKUP_USER, 500, json!({}));

    let authenticator = MagicLinkAuthenticator::with_secret(
        TEST_SECRET,
        HttpLinkDelivery::new(transport.clone()),
        RemoteUserDirectory::new(transport.clone()),
        MagicLinkConfig::new("https://example.com").unwrap(),
    )
    .unwrap();

    let link = authenticator.generate_default_link("a@b.com").unwrap();
    let token = authenticator.extract_token(&link).unwrap();

    assert!(matches!(
        authenticator.authenticate_user(&token).await,
        Err(Error::Transport(TransportError::UnexpectedStatus(500)))
    ));
}

/// 测试远程客户端的完整流程
#[tokio::test]
async fn test_remote_client_flow() {
    let transport = Arc::new(MockTransport::new());
    let client = RemoteMagicLinkClient::new(
        transport.clone(),
        HmacTokenCodec::from_secret(TEST_SECRET).unwrap(),
        "https://auth.example.com",
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock::at_timestamp(T)));

    let link = client
        .generate_link("a@b.com", Duration::from_secs(600))
        .unwrap();
    let token = client.extract_token(&link).unwrap();
    assert_eq!(
        link.as_str(),
        format!("https://auth.example.com/auth/{}", token)
    );

    transport.respond(paths::SEND_MAGIC_LINK, 200, json!({ "success": true }));
    client.send_link("a@b.com", &link).await.unwrap();

    transport.respond(paths::VERIFY_TOKEN, 200, json!({ "valid": true }));
    transport.respond(paths::AUTHENTICATE, 200, json!({ "id": "u1", "email": "a@b.com" }));
    let user = client.authenticate_user(&token).await.unwrap().unwrap();
    assert_eq!(user.email, "a@b.com");

    let requests = transport.requests();
    assert_eq!(requests[1].1, json!({ "token": token }));
    assert_eq!(
        transport.paths(),
        vec!["send-magic-link", "verify-token", "authenticate"]
    );
}

/// 测试远程客户端的错误状态
#[tokio::test]
async fn test_remote_client_errors() {
    let transport = Arc::new(MockTransport::new());
    let client = RemoteMagicLinkClient::new(
        transport.clone(),
        HmacTokenCodec::from_secret(TEST_SECRET).unwrap(),
        "https://auth.example.com",
    )
    .unwrap();

    transport.respond(paths::VERIFY_TOKEN, 401, json!({}));
    assert!(matches!(
        client.verify_token("tok").await,
        Err(Error::Transport(TransportError::UnexpectedStatus(401)))
    ));

    transport.respond(paths::VERIFY_TOKEN, 200, json!({ "valid": true }));
    transport.respond(paths::AUTHENTICATE, 403, json!({}));
    assert!(matches!(
        client.authenticate_user("tok").await,
        Err(Error::Transport(TransportError::UnexpectedStatus(403)))
    ));

    transport.respond(paths::SEND_MAGIC_LINK, 500, json!({}));
    assert!(matches!(
        client.send_link("a@b.com", &link()).await,
        Err(Error::DeliveryFailed(_))
    ));
}

/// 测试内存目录与远程目录可以互换
#[tokio::test]
async fn test_directories_are_interchangeable() {
    let directories: Vec<Box<dyn UserDirectory>> = vec![
        Box::new(InMemoryUserDirectory::new()),
        Box::new(RemoteUserDirectory::new(Arc::new(MockTransport::new()))),
    ];

    assert_eq!(directories[0].lookup("a@b.com").await.unwrap(), None);
    assert!(directories[1].lookup("a@b.com").await.is_err());
}
