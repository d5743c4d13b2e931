//! 会话与系统标记

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;
use crate::store::{Entity, EntityKind};

/// 当前会话
///
/// 整个钱包只有一个当前会话，固定 ID 为 [`Session::CURRENT`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    /// 签名后的 JWT
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub const CURRENT: &'static str = "current";
}

impl Entity for Session {
    const KIND: EntityKind = EntityKind::Session;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// 系统标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFlag {
    pub id: String,
    pub set_at: DateTime<Utc>,
}

impl MetaFlag {
    /// 演示数据已写入
    pub const SEEDED: &'static str = "seeded";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            set_at: Utc::now(),
        }
    }
}

impl Entity for MetaFlag {
    const KIND: EntityKind = EntityKind::Meta;

    fn entity_id(&self) -> &str {
        &self.id
    }
}
