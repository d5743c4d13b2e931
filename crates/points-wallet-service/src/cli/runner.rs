//! 命令执行器
//!
//! 将命令行参数转化为服务调用，结果统一序列化为 JSON。

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use super::commands::Commands;
use crate::app::PointsWallet;
use crate::error::PointsError;
use crate::models::{NewReward, RequestStatus, RewardUpdate, Role, UserProfile};
use crate::service::{LegacySnapshot, RegisterRequest};

/// 命令执行器
pub struct CommandRunner {
    wallet: PointsWallet,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

impl CommandRunner {
    pub fn new(wallet: PointsWallet) -> Self {
        Self { wallet }
    }

    pub fn wallet(&self) -> &PointsWallet {
        &self.wallet
    }

    /// 当前登录用户，未登录返回 Unauthorized
    async fn current_user(&self) -> Result<UserProfile> {
        self.wallet
            .identity
            .current_session()
            .await?
            .ok_or_else(|| PointsError::Unauthorized("请先登录".to_string()).into())
    }

    /// 当前登录管理员，学生返回 Unauthorized
    async fn current_admin(&self) -> Result<UserProfile> {
        let user = self.current_user().await?;
        if user.role != Role::Admin {
            return Err(PointsError::Unauthorized("需要管理员权限".to_string()).into());
        }
        Ok(user)
    }

    /// 执行单个子命令
    pub async fn run(&self, command: Commands) -> Result<Value> {
        let wallet = &self.wallet;
        match command {
            Commands::Seed => match wallet.migration.seed_demo_data().await? {
                Some(report) => to_json(&report),
                None => Ok(json!({ "seeded": false, "message": "demo data already present" })),
            },
            Commands::Reset => to_json(&wallet.migration.reset().await?),
            Commands::Import { file } => {
                let raw = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("读取快照文件失败: {}", file.display()))?;
                let snapshot: LegacySnapshot =
                    serde_json::from_str(&raw).context("快照文件格式不正确")?;
                to_json(&wallet.migration.import_legacy(snapshot).await?)
            }
            Commands::Register {
                email,
                password,
                name,
                phone,
                role,
            } => {
                let session = wallet
                    .identity
                    .register(RegisterRequest {
                        email,
                        password,
                        name,
                        phone,
                        role,
                    })
                    .await?;
                to_json(&session.user)
            }
            Commands::Login { email, password } => {
                let session = wallet.identity.authenticate(&email, &password).await?;
                to_json(&session.user)
            }
            Commands::Logout => {
                wallet.identity.end_session().await?;
                Ok(json!({ "loggedOut": true }))
            }
            Commands::Whoami => to_json(&wallet.identity.current_session().await?),
            Commands::Rewards => to_json(&wallet.catalog.list_rewards().await?),
            Commands::RewardAdd {
                title,
                cost,
                quantity,
                description,
            } => {
                self.current_admin().await?;
                let reward = wallet
                    .catalog
                    .create_reward(NewReward {
                        title,
                        cost,
                        quantity,
                        description,
                    })
                    .await?;
                to_json(&reward)
            }
            Commands::RewardUpdate {
                id,
                title,
                cost,
                quantity,
                description,
            } => {
                self.current_admin().await?;
                let update = RewardUpdate {
                    title,
                    cost,
                    quantity,
                    description,
                };
                to_json(&wallet.catalog.update_reward(&id, update).await?)
            }
            Commands::RewardDelete { id } => {
                self.current_admin().await?;
                wallet.catalog.delete_reward(&id).await?;
                Ok(json!({ "deleted": id }))
            }
            Commands::Redeem { reward_id } => {
                let user = self.current_user().await?;
                to_json(&wallet.redemptions.redeem(&reward_id, &user.id).await?)
            }
            Commands::Request { amount, reason } => {
                let user = self.current_user().await?;
                to_json(&wallet.requests.submit(&user.id, amount, &reason).await?)
            }
            Commands::Requests { pending } => {
                let user = self.current_user().await?;
                let requests = match (user.role == Role::Admin, pending) {
                    (true, true) => wallet.requests.list_pending().await?,
                    (true, false) => wallet.requests.list_all().await?,
                    (false, pending) => {
                        let mut own = wallet.requests.list_for_user(&user.id).await?;
                        if pending {
                            own.retain(|r| r.status == RequestStatus::Pending);
                        }
                        own
                    }
                };
                to_json(&requests)
            }
            Commands::Approve { request_id } => {
                let admin = self.current_admin().await?;
                to_json(&wallet.requests.approve(&request_id, &admin.id).await?)
            }
            Commands::Reject { request_id } => {
                let admin = self.current_admin().await?;
                to_json(&wallet.requests.reject(&request_id, &admin.id).await?)
            }
            Commands::Adjust {
                user,
                delta,
                reason,
            } => {
                let admin = self.current_admin().await?;
                let profile = wallet
                    .adjustments
                    .adjust_points(&user, delta, &reason, &admin.id)
                    .await?;
                info!(user_id = %profile.id, balance = profile.points, "积分已调整");
                to_json(&profile)
            }
            Commands::History { user } => {
                let current = self.current_user().await?;
                let target = match user {
                    Some(id) if id != current.id => {
                        self.current_admin().await?;
                        wallet.identity.get_user(&id).await?.id
                    }
                    _ => current.id,
                };
                to_json(&wallet.ledger.transactions_for_user(&target).await?)
            }
            Commands::Users { role } => {
                self.current_admin().await?;
                to_json(&wallet.identity.list_users(role).await?)
            }
            Commands::Audit => {
                self.current_admin().await?;
                let mismatches = wallet.ledger.reconcile().await?;
                Ok(json!({
                    "consistent": mismatches.is_empty(),
                    "mismatches": mismatches,
                }))
            }
        }
    }
}
