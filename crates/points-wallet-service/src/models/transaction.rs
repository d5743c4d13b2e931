//! 积分流水实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TransactionType;
use crate::store::{Entity, EntityKind};

/// 积分流水
///
/// 只追加不修改，类型由金额符号推导
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    /// 带符号金额
    pub amount: i64,
    pub reason: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    /// 创建一条新流水，ID 使用时间有序的 UUID v7
    pub fn new(user_id: impl Into<String>, amount: i64, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            amount,
            reason: reason.into(),
            date: Utc::now(),
            kind: TransactionType::from_amount(amount),
        }
    }
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn entity_id(&self) -> &str {
        &self.id
    }
}
