//! 测试环境管理
//!
//! 每个测试独占一个临时目录和一个 SQLite 文件，互不干扰。

use anyhow::{Context, Result};
use points_shared::config::{AppConfig, DatabaseConfig, StorageBackend};
use points_shared::database::Database;
use points_wallet::PointsWallet;
use points_wallet::models::{Reward, UserProfile};
use tempfile::TempDir;

use super::super::helpers::DbVerifier;

/// 测试环境
pub struct TestEnvironment {
    pub config: AppConfig,
    pub wallet: PointsWallet,
    /// 直接查询底层表的验证工具
    pub db: DbVerifier,
    // 目录随环境一起释放
    _dir: TempDir,
}

impl TestEnvironment {
    /// 创建空白环境
    pub async fn setup() -> Result<Self> {
        let dir = tempfile::tempdir().context("创建临时目录失败")?;

        let mut config = AppConfig::default();
        config.environment = "test".to_string();
        config.database = DatabaseConfig {
            backend: StorageBackend::Sqlite,
            url: format!("sqlite://{}", dir.path().join("wallet.db").display()),
            ..DatabaseConfig::default()
        };
        config.auth.bcrypt_cost = 4;
        // 并发测试下冲突较多，放宽重试次数
        config.ledger.max_conflict_retries = 50;
        config.ledger.retry_initial_delay_ms = 1;
        config.ledger.retry_max_delay_ms = 20;

        let wallet = PointsWallet::open(&config).await?;
        let database = Database::connect(&config.database).await?;
        let db = DbVerifier::new(database.pool().clone());

        Ok(Self {
            config,
            wallet,
            db,
            _dir: dir,
        })
    }

    /// 创建并写入演示数据
    pub async fn seeded() -> Result<Self> {
        let env = Self::setup().await?;
        env.wallet
            .migration
            .seed_demo_data()
            .await?
            .context("新环境应写入演示数据")?;
        Ok(env)
    }

    /// 以相同配置重新打开存储，模拟进程重启
    pub async fn reopen(&self) -> Result<PointsWallet> {
        Ok(PointsWallet::open(&self.config).await?)
    }

    /// 按邮箱查找用户
    pub async fn user(&self, email: &str) -> Result<UserProfile> {
        self.wallet
            .identity
            .list_users(None)
            .await?
            .into_iter()
            .find(|u| u.email == email)
            .with_context(|| format!("用户不存在: {}", email))
    }

    /// 按标题查找奖品
    pub async fn reward(&self, title: &str) -> Result<Reward> {
        self.wallet
            .catalog
            .list_rewards()
            .await?
            .into_iter()
            .find(|r| r.title == title)
            .with_context(|| format!("奖品不存在: {}", title))
    }
}
