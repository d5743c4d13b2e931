//! 数据导入、演示数据与重置
//!
//! 旧版数据把用户保存在两个命名空间（`dw_users` 与 `fb_users`）中，
//! 导入时按 ID 合并为一份；明文密码转为 bcrypt 哈希；已存在的记录跳过。
//! 所有写入在一个批次中提交，导入要么整体生效，要么完全不生效。

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use points_shared::retry::{RetryPolicy, retry_with_policy};

use crate::auth::hash_password;
use crate::error::{PointsError, Result};
use crate::models::{
    DisplayIdCounter, EmailIndexEntry, MetaFlag, PointRequest, Reward, Role, Transaction,
    TransactionType, User, normalize_email, parse_display_seq,
};
use crate::seed;
use crate::service::dto::ImportReport;
use crate::service::identity_service::load_counter;
use crate::store::{EntityKind, EntityRepository, Expect, WriteBatch};

/// 期初余额调整流水的理由
pub const OPENING_BALANCE_REASON: &str = "Opening balance adjustment";

/// 旧版用户记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub student_id: String,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub points: i64,
    /// 明文或 bcrypt 哈希
    pub password: String,
}

/// 旧版数据快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacySnapshot {
    #[serde(default)]
    pub dw_users: Vec<LegacyUser>,
    #[serde(default)]
    pub fb_users: Vec<LegacyUser>,
    #[serde(default)]
    pub dw_rewards: Vec<Reward>,
    #[serde(default)]
    pub dw_transactions: Vec<Transaction>,
    #[serde(default)]
    pub dw_point_requests: Vec<PointRequest>,
}

impl LegacySnapshot {
    /// 按 ID 合并两个用户命名空间，先出现者优先
    pub fn merged_users(&self) -> Vec<&LegacyUser> {
        let mut seen = HashSet::new();
        self.dw_users
            .iter()
            .chain(self.fb_users.iter())
            .filter(|u| seen.insert(u.id.as_str()))
            .collect()
    }
}

fn is_bcrypt_hash(value: &str) -> bool {
    value.starts_with("$2a$") || value.starts_with("$2b$") || value.starts_with("$2y$")
}

/// 数据迁移服务
#[derive(Clone)]
pub struct MigrationService {
    repo: EntityRepository,
    bcrypt_cost: u32,
    retry: RetryPolicy,
}

impl MigrationService {
    pub fn new(repo: EntityRepository, bcrypt_cost: u32, retry: RetryPolicy) -> Self {
        Self {
            repo,
            bcrypt_cost,
            retry,
        }
    }

    /// 导入旧版数据
    #[instrument(skip(self, snapshot))]
    pub async fn import_legacy(&self, snapshot: LegacySnapshot) -> Result<ImportReport> {
        let hashes = self.hash_passwords(&snapshot)?;
        let report = retry_with_policy(&self.retry, "import_legacy", PointsError::is_retryable, || {
            self.try_import(&snapshot, &hashes, false)
        })
        .await?;

        info!(
            users = report.users_imported,
            rewards = report.rewards_imported,
            transactions = report.transactions_imported,
            requests = report.requests_imported,
            opening_adjustments = report.opening_adjustments,
            "旧版数据导入完成"
        );
        Ok(report)
    }

    /// 写入演示数据（只执行一次）
    ///
    /// 已写入过时返回 None
    #[instrument(skip(self))]
    pub async fn seed_demo_data(&self) -> Result<Option<ImportReport>> {
        if self.is_seeded().await? {
            info!("演示数据已存在，跳过");
            return Ok(None);
        }

        let snapshot = seed::demo_snapshot();
        let hashes = self.hash_passwords(&snapshot)?;
        let result = retry_with_policy(
            &self.retry,
            "seed_demo_data",
            PointsError::is_retryable,
            || self.try_import(&snapshot, &hashes, true),
        )
        .await;

        match result {
            Ok(report) => {
                info!(users = report.users_imported, "演示数据写入完成");
                Ok(Some(report))
            }
            Err(PointsError::ConcurrencyConflict) => {
                // 并发初始化时另一方可能已完成写入
                if self.is_seeded().await? {
                    Ok(None)
                } else {
                    Err(PointsError::ConcurrencyConflict)
                }
            }
            Err(e) => Err(e),
        }
    }

    pub async fn is_seeded(&self) -> Result<bool> {
        Ok(self
            .repo
            .find::<MetaFlag>(MetaFlag::SEEDED)
            .await?
            .is_some())
    }

    /// 清空全部数据并重新写入演示数据
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<ImportReport> {
        let mut batch = WriteBatch::new();
        for kind in EntityKind::ALL {
            for record in self.repo.store().list(kind).await? {
                batch.delete(kind, record.id, Expect::Any);
            }
        }
        let deleted = batch.len();
        self.repo.commit(batch).await?;
        warn!(deleted, "已清空全部数据");

        let report = self.seed_demo_data().await?.unwrap_or_default();
        Ok(report)
    }

    async fn try_import(
        &self,
        snapshot: &LegacySnapshot,
        hashes: &HashMap<String, String>,
        mark_seeded: bool,
    ) -> Result<ImportReport> {
        let (mut batch, report) = self.plan_import(snapshot, hashes).await?;
        if mark_seeded {
            batch.insert(&MetaFlag::new(MetaFlag::SEEDED))?;
        }
        self.repo.commit(batch).await?;
        Ok(report)
    }

    /// 预先计算密码哈希，同一明文只计算一次
    fn hash_passwords(&self, snapshot: &LegacySnapshot) -> Result<HashMap<String, String>> {
        let mut hashes = HashMap::new();
        for user in snapshot.merged_users() {
            if is_bcrypt_hash(&user.password) || hashes.contains_key(&user.password) {
                continue;
            }
            let hash = hash_password(&user.password, self.bcrypt_cost)?;
            hashes.insert(user.password.clone(), hash);
        }
        Ok(hashes)
    }

    /// 根据当前存储内容生成导入批次
    async fn plan_import(
        &self,
        snapshot: &LegacySnapshot,
        hashes: &HashMap<String, String>,
    ) -> Result<(WriteBatch, ImportReport)> {
        let mut batch = WriteBatch::new();
        let mut report = ImportReport::default();
        let now = Utc::now();

        // === 用户 ===
        let existing_users = self.repo.list::<User>().await?;
        let existing_ids: HashSet<String> = existing_users.iter().map(|u| u.id.clone()).collect();
        let mut taken_emails: HashSet<String> = self
            .repo
            .list::<EmailIndexEntry>()
            .await?
            .into_iter()
            .map(|e| e.email)
            .collect();
        let mut taken_display_ids: HashSet<String> =
            existing_users.iter().map(|u| u.display_id.clone()).collect();

        let mut counters: HashMap<Role, (DisplayIdCounter, Expect)> = HashMap::new();
        for role in [Role::Student, Role::Admin] {
            counters.insert(role, load_counter(&self.repo, role).await?);
        }

        let mut imported_users: Vec<User> = Vec::new();
        for legacy in snapshot.merged_users() {
            if existing_ids.contains(&legacy.id) {
                report.users_skipped += 1;
                continue;
            }
            let email = normalize_email(&legacy.email);
            if !taken_emails.insert(email.clone()) {
                warn!(user_id = %legacy.id, email = %email, "邮箱已被占用，跳过该用户");
                report.users_skipped += 1;
                continue;
            }

            let Some((counter, _)) = counters.get_mut(&legacy.role) else {
                return Err(PointsError::Internal(format!("缺少角色计数器: {}", legacy.role)));
            };
            let display_id = match parse_display_seq(legacy.role, &legacy.student_id) {
                Some(seq) if !taken_display_ids.contains(&legacy.student_id) => {
                    counter.last = counter.last.max(seq);
                    legacy.student_id.clone()
                }
                _ => counter.reserve(),
            };
            taken_display_ids.insert(display_id.clone());

            let password_hash = if is_bcrypt_hash(&legacy.password) {
                legacy.password.clone()
            } else {
                hashes.get(&legacy.password).cloned().ok_or_else(|| {
                    PointsError::Internal(format!("缺少密码哈希: user_id={}", legacy.id))
                })?
            };

            let user = User {
                id: legacy.id.clone(),
                name: legacy.name.trim().to_string(),
                display_id,
                role: legacy.role,
                email,
                phone: legacy.phone.clone(),
                points: legacy.points,
                password_hash,
                created_at: now,
            };
            batch.insert(&user)?;
            batch.insert(&EmailIndexEntry::new(&user.email, &user.id))?;
            imported_users.push(user);
        }

        if !imported_users.is_empty() {
            for (counter, expect) in counters.values() {
                batch.put_with(counter, *expect)?;
            }
        }
        report.users_imported = imported_users.len();
        let imported_ids: HashSet<&str> = imported_users.iter().map(|u| u.id.as_str()).collect();

        // === 奖品 ===
        // 已存在或本批已计划写入的 ID，快照内重复的记录按跳过处理
        let mut planned_rewards: HashSet<String> = self
            .repo
            .list::<Reward>()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        for reward in &snapshot.dw_rewards {
            if !planned_rewards.insert(reward.id.clone()) {
                report.rewards_skipped += 1;
                continue;
            }
            if reward.cost <= 0 || reward.quantity < 0 {
                return Err(PointsError::InvalidRequest(format!(
                    "奖品数据无效: id={}, cost={}, quantity={}",
                    reward.id, reward.cost, reward.quantity
                )));
            }
            batch.insert(reward)?;
            report.rewards_imported += 1;
        }

        // === 流水 ===
        // 只接收本次导入用户的流水，已有用户的余额不受导入影响
        let mut planned_transactions: HashSet<String> = self
            .repo
            .list::<Transaction>()
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let mut sums: HashMap<&str, i64> = HashMap::new();
        for legacy in &snapshot.dw_transactions {
            if !imported_ids.contains(legacy.user_id.as_str())
                || !planned_transactions.insert(legacy.id.clone())
            {
                report.transactions_skipped += 1;
                continue;
            }
            let mut transaction = legacy.clone();
            transaction.kind = TransactionType::from_amount(transaction.amount);
            let sum = sums.entry(legacy.user_id.as_str()).or_default();
            *sum = sum.checked_add(transaction.amount).ok_or_else(|| {
                PointsError::InvalidRequest(format!(
                    "流水合计溢出: user_id={}, amount={}",
                    legacy.user_id, transaction.amount
                ))
            })?;
            batch.insert(&transaction)?;
            report.transactions_imported += 1;
        }

        // 缓存余额与流水合计不一致时补记期初调整
        for user in &imported_users {
            let ledger = sums.get(user.id.as_str()).copied().unwrap_or(0);
            let diff = user.points.checked_sub(ledger).ok_or_else(|| {
                PointsError::InvalidRequest(format!(
                    "期初调整溢出: user_id={}, points={}, ledger={}",
                    user.id, user.points, ledger
                ))
            })?;
            if diff != 0 {
                let mut opening = Transaction::new(&user.id, diff, OPENING_BALANCE_REASON);
                opening.date = earliest_before(&snapshot.dw_transactions, &user.id, now);
                batch.insert(&opening)?;
                report.opening_adjustments += 1;
            }
        }

        // === 积分申请 ===
        let mut planned_requests: HashSet<String> = self
            .repo
            .list::<PointRequest>()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        for request in &snapshot.dw_point_requests {
            let known_user = imported_ids.contains(request.user_id.as_str())
                || existing_ids.contains(&request.user_id);
            if !known_user || request.amount <= 0 || !planned_requests.insert(request.id.clone()) {
                report.requests_skipped += 1;
                continue;
            }
            batch.insert(request)?;
            report.requests_imported += 1;
        }

        Ok((batch, report))
    }
}

/// 期初调整的记账时间：早于该用户最早一条旧流水，保证按时间排序时排在最后
fn earliest_before(
    transactions: &[Transaction],
    user_id: &str,
    fallback: DateTime<Utc>,
) -> DateTime<Utc> {
    transactions
        .iter()
        .filter(|t| t.user_id == user_id)
        .map(|t| t.date)
        .min()
        .map(|d| d - chrono::Duration::seconds(1))
        .unwrap_or(fallback)
}
