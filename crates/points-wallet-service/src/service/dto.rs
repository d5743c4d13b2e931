//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Transaction, UserProfile};

/// 记账结果
///
/// 包含新写入的流水和记账后的用户视图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPosting {
    pub transaction: Transaction,
    pub user: UserProfile,
}

/// 余额核对结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAudit {
    pub user_id: String,
    /// 用户记录上的缓存余额
    pub cached_points: i64,
    /// 流水合计
    pub ledger_points: i64,
    pub transaction_count: usize,
}

impl BalanceAudit {
    pub fn is_consistent(&self) -> bool {
        self.cached_points == self.ledger_points
    }

    /// 缓存余额与流水合计之差
    pub fn drift(&self) -> i64 {
        self.cached_points - self.ledger_points
    }
}

/// 兑换回执
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionReceipt {
    pub reward_id: String,
    pub reward_title: String,
    pub transaction: Transaction,
    /// 兑换后剩余库存
    pub remaining_quantity: i64,
    /// 兑换后余额
    pub balance: i64,
}

/// 认证结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
}

/// 注册参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "姓名不能为空"))]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: crate::models::Role,
}

/// 资料更新参数
///
/// 只允许修改姓名和电话，余额与角色不可由此修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// 导入报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub users_imported: usize,
    pub users_skipped: usize,
    pub rewards_imported: usize,
    pub rewards_skipped: usize,
    pub transactions_imported: usize,
    pub transactions_skipped: usize,
    pub requests_imported: usize,
    pub requests_skipped: usize,
    /// 为对齐缓存余额而补记的期初调整流水数
    pub opening_adjustments: usize,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.users_imported == 0
            && self.rewards_imported == 0
            && self.transactions_imported == 0
            && self.requests_imported == 0
    }
}
