//! 用户身份解析
//!
//! 校验通过的 token 只证明"持有者能收到该邮箱的邮件"，
//! 具体对应哪个用户由 [`UserDirectory`] 决定。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::random::generate_random_hex;

/// 外部存储中的用户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 用户 ID
    pub id: String,
    /// 用户邮箱
    pub email: String,
}

impl UserRecord {
    /// 创建用户记录
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// 认证成功后的用户身份
///
/// 每次认证成功都会新建，本库不做缓存。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// 用户 ID
    pub id: String,
    /// 用户邮箱（即 token 中声明的邮箱）
    pub email: String,
}

/// 用户查找接口
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 按邮箱查找用户，不存在时返回 `None`
    async fn lookup(&self, email: &str) -> Result<Option<UserRecord>>;
}

#[async_trait]
impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    async fn lookup(&self, email: &str) -> Result<Option<UserRecord>> {
        (**self).lookup(email).await
    }
}

/// 内存用户目录
///
/// 适用于单实例部署或测试环境。开启 [`auto_create`](Self::with_auto_create)
/// 后，查找未知邮箱会自动创建用户（lookup-or-create）。
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    /// email -> 记录
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    auto_create: bool,
}

impl InMemoryUserDirectory {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找未知邮箱时自动创建用户
    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    /// 添加或替换用户
    pub fn insert(&self, record: UserRecord) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.email.clone(), record);
    }

    /// 删除用户
    pub fn remove(&self, email: &str) -> Option<UserRecord> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(email)
    }

    /// 用户数量
    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 目录是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, email: &str) -> Result<Option<UserRecord>> {
        if let Some(record) = self
            .users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
        {
            return Ok(Some(record.clone()));
        }

        if !self.auto_create {
            return Ok(None);
        }

        let candidate = UserRecord::new(format!("usr_{}", generate_random_hex(12)?), email);
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        // 并发创建时以先写入者为准
        let record = users.entry(email.to_string()).or_insert(candidate);
        Ok(Some(record.clone()))
    }
}
