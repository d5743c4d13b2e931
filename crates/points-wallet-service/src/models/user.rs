//! 用户相关实体定义
//!
//! 包含用户本体、对外展示视图以及身份模块使用的内部记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;
use crate::store::{Entity, EntityKind};

/// 用户
///
/// `points` 是流水合计的缓存值，只能经由账本引擎写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// 展示编号（STU001 / ADMIN001）
    pub display_id: String,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// 缓存余额
    pub points: i64,
    /// bcrypt 哈希
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 去除密码哈希后的视图
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// 用户对外视图
///
/// 所有对外返回的用户数据均使用此结构，不含密码哈希
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub display_id: String,
    pub role: Role,
    pub email: String,
    pub phone: String,
    pub points: i64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            display_id: user.display_id.clone(),
            role: user.role,
            email: user.email.clone(),
            phone: user.phone.clone(),
            points: user.points,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// 邮箱唯一索引
///
/// 以小写邮箱为 ID，插入时要求不存在，从而保证邮箱唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailIndexEntry {
    pub email: String,
    pub user_id: String,
}

impl EmailIndexEntry {
    pub fn new(email: &str, user_id: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            user_id: user_id.into(),
        }
    }
}

impl Entity for EmailIndexEntry {
    const KIND: EntityKind = EntityKind::EmailIndex;

    fn entity_id(&self) -> &str {
        &self.email
    }
}

/// 展示编号计数器
///
/// 每个角色一条，`last` 为最近一次分配的序号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayIdCounter {
    pub role: Role,
    pub last: u32,
}

impl DisplayIdCounter {
    pub fn counter_id(role: Role) -> &'static str {
        role.as_str()
    }

    /// 分配下一个展示编号
    pub fn reserve(&mut self) -> String {
        self.last += 1;
        format_display_id(self.role, self.last)
    }
}

impl Entity for DisplayIdCounter {
    const KIND: EntityKind = EntityKind::Counter;

    fn entity_id(&self) -> &str {
        Self::counter_id(self.role)
    }
}

/// 生成展示编号，序号至少三位
pub fn format_display_id(role: Role, seq: u32) -> String {
    format!("{}{:03}", role.display_prefix(), seq)
}

/// 解析展示编号中的序号，前缀与角色不符时返回 None
pub fn parse_display_seq(role: Role, display_id: &str) -> Option<u32> {
    display_id
        .strip_prefix(role.display_prefix())
        .and_then(|digits| digits.parse().ok())
}

/// 邮箱归一化：去除首尾空白并转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
