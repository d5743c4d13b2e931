//! 奖品实体定义

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::store::{Entity, EntityKind};

/// 奖品
///
/// `quantity` 只会随兑换扣减原子地减少，且永不为负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub title: String,
    /// 兑换所需积分
    pub cost: i64,
    /// 剩余库存
    pub quantity: i64,
    #[serde(default)]
    pub description: String,
}

impl Reward {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

impl Entity for Reward {
    const KIND: EntityKind = EntityKind::Reward;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// 新建奖品参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    #[validate(length(min = 1, message = "奖品名称不能为空"))]
    pub title: String,
    #[validate(range(min = 1, message = "积分消耗必须大于 0"))]
    pub cost: i64,
    #[validate(range(min = 0, message = "库存不能为负"))]
    pub quantity: i64,
    #[serde(default)]
    pub description: String,
}

/// 奖品部分更新参数
///
/// 未提供的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RewardUpdate {
    #[validate(length(min = 1, message = "奖品名称不能为空"))]
    pub title: Option<String>,
    #[validate(range(min = 1, message = "积分消耗必须大于 0"))]
    pub cost: Option<i64>,
    #[validate(range(min = 0, message = "库存不能为负"))]
    pub quantity: Option<i64>,
    pub description: Option<String>,
}

impl RewardUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.cost.is_none()
            && self.quantity.is_none()
            && self.description.is_none()
    }

    /// 将更新合并到奖品上
    pub fn apply_to(&self, reward: &mut Reward) {
        if let Some(title) = &self.title {
            reward.title = title.trim().to_string();
        }
        if let Some(cost) = self.cost {
            reward.cost = cost;
        }
        if let Some(quantity) = self.quantity {
            reward.quantity = quantity;
        }
        if let Some(description) = &self.description {
            reward.description = description.clone();
        }
    }
}
