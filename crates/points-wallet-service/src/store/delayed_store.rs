//! 延迟存储装饰器
//!
//! 在每次存储调用前注入随机延迟，用于在本地复现慢速后端下的并发交错

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::traits::{EntityKind, EntityStore, StoredRecord, WriteBatch};
use crate::error::Result;

/// 为内部存储的每次调用增加 `[min_ms, max_ms]` 区间内的随机延迟
pub struct DelayedStore<S> {
    inner: S,
    min_ms: u64,
    max_ms: u64,
}

impl<S: EntityStore> DelayedStore<S> {
    pub fn new(inner: S, min_ms: u64, max_ms: u64) -> Self {
        Self {
            inner,
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    fn next_delay(&self) -> Duration {
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<S: EntityStore> EntityStore for DelayedStore<S> {
    async fn list(&self, kind: EntityKind) -> Result<Vec<StoredRecord>> {
        self.pause().await;
        self.inner.list(kind).await
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<StoredRecord>> {
        self.pause().await;
        self.inner.get(kind, id).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.pause().await;
        self.inner.commit(batch).await
    }
}
