//! 奖品目录服务
//!
//! 管理员维护奖品；库存扣减不经过这里，只随兑换发生

use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use points_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{PointsError, Result};
use crate::models::{NewReward, Reward, RewardUpdate};
use crate::store::{EntityRepository, WriteBatch};

/// 奖品目录服务
#[derive(Clone)]
pub struct CatalogService {
    repo: EntityRepository,
    retry: RetryPolicy,
}

impl CatalogService {
    pub fn new(repo: EntityRepository, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    pub async fn list_rewards(&self) -> Result<Vec<Reward>> {
        self.repo.list::<Reward>().await
    }

    pub async fn get_reward(&self, reward_id: &str) -> Result<Reward> {
        Ok(self.repo.get::<Reward>(reward_id).await?.into_inner())
    }

    /// 新建奖品
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_reward(&self, input: NewReward) -> Result<Reward> {
        input.validate()?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(PointsError::InvalidRequest("奖品名称不能为空".to_string()));
        }

        let reward = Reward {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            cost: input.cost,
            quantity: input.quantity,
            description: input.description,
        };

        let mut batch = WriteBatch::new();
        batch.insert(&reward)?;
        self.repo.commit(batch).await?;

        info!(reward_id = %reward.id, "奖品已创建");
        Ok(reward)
    }

    /// 部分更新奖品
    ///
    /// 以读取到的版本为条件写回，与并发兑换冲突时重新读取后再合并
    #[instrument(skip(self, update))]
    pub async fn update_reward(&self, reward_id: &str, update: RewardUpdate) -> Result<Reward> {
        update.validate()?;
        if update
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(PointsError::InvalidRequest("奖品名称不能为空".to_string()));
        }

        let reward = retry_with_policy(&self.retry, "update_reward", PointsError::is_retryable, || {
            self.try_update(reward_id, &update)
        })
        .await?;

        info!(quantity = reward.quantity, cost = reward.cost, "奖品已更新");
        Ok(reward)
    }

    async fn try_update(&self, reward_id: &str, update: &RewardUpdate) -> Result<Reward> {
        let current = self.repo.get::<Reward>(reward_id).await?;
        let mut reward = current.value;
        update.apply_to(&mut reward);

        let mut batch = WriteBatch::new();
        batch.update(&reward, current.version)?;
        self.repo.commit(batch).await?;
        Ok(reward)
    }

    /// 删除奖品
    #[instrument(skip(self))]
    pub async fn delete_reward(&self, reward_id: &str) -> Result<()> {
        retry_with_policy(&self.retry, "delete_reward", PointsError::is_retryable, || {
            self.repo.delete::<Reward>(reward_id)
        })
        .await?;
        info!("奖品已删除");
        Ok(())
    }
}
