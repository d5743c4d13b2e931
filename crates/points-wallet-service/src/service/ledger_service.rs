//! 积分账本服务
//!
//! 余额变动的唯一入口。每次记账都会：
//! - 生成一条不可变流水（类型由金额符号决定）
//! - 以读取到的用户版本为条件，把 `points + amount` 写回用户记录
//!
//! 两个写入放在同一个写批次中提交，因此「余额 = 流水合计」在任何时刻都成立。
//! 其他服务（审核、兑换）通过 [`LedgerService::stage_transaction`] 把记账写入
//! 追加到自己的批次里，与自身的状态变更一起提交。

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use points_shared::observability::metrics;
use points_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{PointsError, Result};
use crate::models::{Transaction, User};
use crate::service::dto::{BalanceAudit, LedgerPosting};
use crate::store::{EntityRepository, Versioned, WriteBatch};

/// 积分账本服务
#[derive(Clone)]
pub struct LedgerService {
    repo: EntityRepository,
    retry: RetryPolicy,
}

impl LedgerService {
    pub fn new(repo: EntityRepository, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    /// 把一笔记账追加到调用方的写批次
    ///
    /// 批次中新增两项：流水插入，以及以 `user.version` 为条件的用户余额更新。
    /// 返回流水和记账后的用户（尚未提交）。
    pub fn stage_transaction(
        batch: &mut WriteBatch,
        user: &Versioned<User>,
        amount: i64,
        reason: &str,
    ) -> Result<(Transaction, User)> {
        let points = user.value.points.checked_add(amount).ok_or_else(|| {
            PointsError::InvalidRequest(format!(
                "余额溢出: user_id={}, points={}, amount={}",
                user.value.id, user.value.points, amount
            ))
        })?;

        let transaction = Transaction::new(&user.value.id, amount, reason);
        let mut updated = user.value.clone();
        updated.points = points;

        batch.insert(&transaction)?;
        batch.update(&updated, user.version)?;

        Ok((transaction, updated))
    }

    /// 批次提交成功后记录指标
    pub fn note_committed(transaction: &Transaction) {
        metrics::record_transaction(transaction.kind.as_str());
    }

    /// 记一笔流水并更新余额
    ///
    /// 用户不存在时返回 `UserNotFound`，不产生任何写入
    #[instrument(skip(self, reason), fields(user_id = %user_id, amount))]
    pub async fn record_transaction(
        &self,
        user_id: &str,
        amount: i64,
        reason: &str,
    ) -> Result<Transaction> {
        Ok(self.post(user_id, amount, reason).await?.transaction)
    }

    /// 记账并返回记账后的用户视图
    #[instrument(skip(self, reason), fields(user_id = %user_id, amount))]
    pub async fn post(&self, user_id: &str, amount: i64, reason: &str) -> Result<LedgerPosting> {
        let posting = retry_with_policy(
            &self.retry,
            "record_transaction",
            PointsError::is_retryable,
            || self.try_post(user_id, amount, reason),
        )
        .await?;

        info!(
            transaction_id = %posting.transaction.id,
            kind = posting.transaction.kind.as_str(),
            balance = posting.user.points,
            "积分流水已记录"
        );
        Ok(posting)
    }

    async fn try_post(&self, user_id: &str, amount: i64, reason: &str) -> Result<LedgerPosting> {
        let user = self.repo.get::<User>(user_id).await?;

        let mut batch = WriteBatch::new();
        let (transaction, updated) = Self::stage_transaction(&mut batch, &user, amount, reason)?;
        self.repo.commit(batch).await?;
        Self::note_committed(&transaction);

        Ok(LedgerPosting {
            transaction,
            user: updated.profile(),
        })
    }

    /// 查询用户当前余额
    pub async fn balance(&self, user_id: &str) -> Result<i64> {
        Ok(self.repo.get::<User>(user_id).await?.value.points)
    }

    /// 查询用户流水（时间倒序）
    #[instrument(skip(self))]
    pub async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        // 先确认用户存在，避免把拼错的 ID 当作「无流水」
        self.repo.get::<User>(user_id).await?;

        let transactions = self
            .repo
            .list_by::<Transaction, _>(|t| t.user_id == user_id)
            .await?;
        debug!(count = transactions.len(), "查询用户流水");
        Ok(newest_first(transactions))
    }

    /// 查询全部流水（时间倒序）
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(newest_first(self.repo.list::<Transaction>().await?))
    }

    /// 核对单个用户的缓存余额与流水合计
    #[instrument(skip(self))]
    pub async fn audit_user(&self, user_id: &str) -> Result<BalanceAudit> {
        let user = self.repo.get::<User>(user_id).await?.into_inner();
        let transactions = self
            .repo
            .list_by::<Transaction, _>(|t| t.user_id == user_id)
            .await?;

        Ok(BalanceAudit {
            user_id: user.id,
            cached_points: user.points,
            ledger_points: transactions.iter().map(|t| t.amount).sum(),
            transaction_count: transactions.len(),
        })
    }

    /// 全量核对，返回所有不一致的用户
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<Vec<BalanceAudit>> {
        let users = self.repo.list::<User>().await?;
        let transactions = self.repo.list::<Transaction>().await?;

        let mut sums: HashMap<&str, (i64, usize)> = HashMap::new();
        for t in &transactions {
            let entry = sums.entry(t.user_id.as_str()).or_default();
            entry.0 += t.amount;
            entry.1 += 1;
        }

        let mismatches: Vec<BalanceAudit> = users
            .iter()
            .map(|user| {
                let (ledger_points, transaction_count) =
                    sums.get(user.id.as_str()).copied().unwrap_or_default();
                BalanceAudit {
                    user_id: user.id.clone(),
                    cached_points: user.points,
                    ledger_points,
                    transaction_count,
                }
            })
            .filter(|audit| !audit.is_consistent())
            .collect();

        info!(
            users = users.len(),
            transactions = transactions.len(),
            mismatches = mismatches.len(),
            "账本核对完成"
        );
        Ok(mismatches)
    }
}

/// 按时间倒序排列，同一时刻的流水后写入的在前
fn newest_first(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.reverse();
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
    transactions
}
