//! 应用装配
//!
//! 按配置选择存储后端，构造各服务并共享同一仓储。

use std::sync::Arc;

use points_shared::config::{AppConfig, StorageBackend};
use points_shared::database::Database;
use points_shared::retry::RetryPolicy;
use tracing::info;

use crate::error::Result;
use crate::service::{
    AdjustmentService, CatalogService, IdentityService, LedgerService, MigrationService,
    RedemptionService, RequestService,
};
use crate::store::{
    DelayedStore, EntityRepository, EntityStore, MIGRATOR, MemoryStore, SqliteStore,
};

/// 积分钱包
///
/// 持有所有服务，克隆开销为若干 `Arc`
#[derive(Clone)]
pub struct PointsWallet {
    pub repo: EntityRepository,
    pub ledger: LedgerService,
    pub requests: RequestService,
    pub redemptions: RedemptionService,
    pub catalog: CatalogService,
    pub identity: IdentityService,
    pub adjustments: AdjustmentService,
    pub migration: MigrationService,
}

impl PointsWallet {
    /// 按配置打开存储并装配服务
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn EntityStore> = match config.database.backend {
            StorageBackend::Sqlite => {
                let db = Database::connect(&config.database).await?;
                db.run_migrations(&MIGRATOR).await?;
                Self::maybe_delayed(SqliteStore::new(db.pool().clone()), config)
            }
            StorageBackend::Memory => Self::maybe_delayed(MemoryStore::new(), config),
        };
        info!(backend = ?config.database.backend, "存储已就绪");

        Ok(Self::with_store(store, config))
    }

    /// 使用已有存储装配服务
    pub fn with_store(store: Arc<dyn EntityStore>, config: &AppConfig) -> Self {
        let retry = RetryPolicy::from_millis(
            config.ledger.max_conflict_retries,
            config.ledger.retry_initial_delay_ms,
            config.ledger.retry_max_delay_ms,
        );
        let repo = EntityRepository::new(store);
        let ledger = LedgerService::new(repo.clone(), retry.clone());

        Self {
            requests: RequestService::new(repo.clone(), retry.clone()),
            redemptions: RedemptionService::new(repo.clone(), retry.clone()),
            catalog: CatalogService::new(repo.clone(), retry.clone()),
            identity: IdentityService::new(repo.clone(), &config.auth, retry.clone()),
            adjustments: AdjustmentService::new(ledger.clone()),
            migration: MigrationService::new(repo.clone(), config.auth.bcrypt_cost, retry),
            ledger,
            repo,
        }
    }

    /// 进程内存储，测试用
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }

    fn maybe_delayed<S>(store: S, config: &AppConfig) -> Arc<dyn EntityStore>
    where
        S: EntityStore + 'static,
    {
        match config.ledger.simulated_latency() {
            Some((min, max)) => {
                info!(min_ms = min, max_ms = max, "启用模拟存储延迟");
                Arc::new(DelayedStore::new(store, min, max))
            }
            None => Arc::new(store),
        }
    }
}
