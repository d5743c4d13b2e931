//! 积分钱包枚举类型定义
//!
//! 所有枚举以 SCREAMING_SNAKE_CASE 形式序列化，与历史存储数据保持一致

use std::fmt;

use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 学生 - 申请和兑换积分
    #[default]
    Student,
    /// 管理员 - 审核申请、调整积分、维护奖品
    Admin,
}

impl Role {
    /// 展示编号前缀（STU001 / ADMIN001）
    pub fn display_prefix(&self) -> &'static str {
        match self {
            Self::Student => "STU",
            Self::Admin => "ADMIN",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Self::Student),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("未知角色: {}", other)),
        }
    }
}

/// 流水类型
///
/// 完全由金额符号决定：非负为 EARN，负数为 REDEEM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// 获得积分（+）
    Earn,
    /// 消耗积分（-）
    Redeem,
}

impl TransactionType {
    /// 由金额推导流水类型，零按 EARN 处理
    pub fn from_amount(amount: i64) -> Self {
        if amount < 0 { Self::Redeem } else { Self::Earn }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earn => "EARN",
            Self::Redeem => "REDEEM",
        }
    }
}

/// 积分申请状态
///
/// 只允许 PENDING -> APPROVED 或 PENDING -> REJECTED，终态不可逆
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// 待审核
    #[default]
    Pending,
    /// 已通过 - 已入账
    Approved,
    /// 已拒绝 - 无账务影响
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// 检查状态迁移是否合法
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
