//! 奖品兑换服务
//!
//! 处理奖品兑换的核心业务逻辑，包括：
//! - 奖品存在性与库存检查
//! - 用户余额检查
//! - 库存扣减与积分扣减同批提交
//!
//! ## 兑换流程
//!
//! 1. 读取奖品 -> 2. 库存检查 -> 3. 读取用户 -> 4. 余额检查
//!    -> 5. 暂存库存扣减与记账 -> 6. 原子提交（版本冲突时整体重试）

use std::time::Instant;

use tracing::{info, instrument, warn};

use points_shared::observability::metrics;
use points_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{PointsError, Result};
use crate::models::{Reward, User};
use crate::service::dto::RedemptionReceipt;
use crate::service::ledger_service::LedgerService;
use crate::store::{EntityRepository, WriteBatch};

/// 兑换流水理由
pub fn redemption_reason(title: &str) -> String {
    format!("Redeemed: {}", title)
}

/// 奖品兑换服务
#[derive(Clone)]
pub struct RedemptionService {
    repo: EntityRepository,
    retry: RetryPolicy,
}

impl RedemptionService {
    pub fn new(repo: EntityRepository, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    /// 兑换奖品
    ///
    /// 两项检查都通过后才会产生写入；库存和积分要么同时扣减，要么都不变
    #[instrument(skip(self), fields(reward_id = %reward_id, user_id = %user_id))]
    pub async fn redeem(&self, reward_id: &str, user_id: &str) -> Result<RedemptionReceipt> {
        let start = Instant::now();
        let result = retry_with_policy(&self.retry, "redeem", PointsError::is_retryable, || {
            self.try_redeem(reward_id, user_id)
        })
        .await;

        let elapsed = start.elapsed().as_secs_f64();
        match &result {
            Ok(receipt) => {
                metrics::record_redemption("success", elapsed);
                info!(
                    transaction_id = %receipt.transaction.id,
                    remaining_quantity = receipt.remaining_quantity,
                    balance = receipt.balance,
                    "奖品兑换成功"
                );
            }
            Err(e) => {
                metrics::record_redemption(e.error_code(), elapsed);
                warn!(error = %e, "奖品兑换失败");
            }
        }
        result
    }

    async fn try_redeem(&self, reward_id: &str, user_id: &str) -> Result<RedemptionReceipt> {
        let reward = self.repo.get::<Reward>(reward_id).await?;
        if !reward.value.in_stock() {
            return Err(PointsError::OutOfStock(reward_id.to_string()));
        }

        let user = self.repo.get::<User>(user_id).await?;
        if user.value.points < reward.value.cost {
            return Err(PointsError::InsufficientPoints {
                required: reward.value.cost,
                available: user.value.points,
            });
        }

        let mut updated_reward = reward.value.clone();
        updated_reward.quantity -= 1;

        let mut batch = WriteBatch::new();
        batch.update(&updated_reward, reward.version)?;
        let (transaction, updated_user) = LedgerService::stage_transaction(
            &mut batch,
            &user,
            -reward.value.cost,
            &redemption_reason(&reward.value.title),
        )?;

        self.repo.commit(batch).await?;
        LedgerService::note_committed(&transaction);

        Ok(RedemptionReceipt {
            reward_id: updated_reward.id,
            reward_title: updated_reward.title,
            transaction,
            remaining_quantity: updated_reward.quantity,
            balance: updated_user.points,
        })
    }
}
