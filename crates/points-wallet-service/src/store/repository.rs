//! 类型化实体仓储
//!
//! 在原始存储之上负责 JSON 与领域模型之间的转换，并把缺失记录映射为对应的 NotFound 错误

use std::sync::Arc;

use super::traits::{Entity, EntityKind, EntityStore, Expect, StoredRecord, Versioned, WriteBatch};
use crate::error::{PointsError, Result};

/// 按种类构造 NotFound 错误
pub fn not_found(kind: EntityKind, id: &str) -> PointsError {
    match kind {
        EntityKind::User => PointsError::UserNotFound(id.to_string()),
        EntityKind::Reward => PointsError::RewardNotFound(id.to_string()),
        EntityKind::PointRequest => PointsError::RequestNotFound(id.to_string()),
        other => PointsError::Internal(format!("记录不存在: {}/{}", other, id)),
    }
}

fn decode<T: Entity>(record: StoredRecord) -> Result<Versioned<T>> {
    Ok(Versioned {
        version: record.version,
        value: serde_json::from_value(record.body)?,
    })
}

/// 类型化实体仓储
#[derive(Clone)]
pub struct EntityRepository {
    store: Arc<dyn EntityStore>,
}

impl EntityRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// 列出某类实体（插入顺序）
    pub async fn list<T: Entity>(&self) -> Result<Vec<T>> {
        Ok(self
            .list_versioned::<T>()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .collect())
    }

    /// 列出某类实体并附带版本号
    pub async fn list_versioned<T: Entity>(&self) -> Result<Vec<Versioned<T>>> {
        self.store
            .list(T::KIND)
            .await?
            .into_iter()
            .map(decode::<T>)
            .collect()
    }

    /// 按条件过滤
    pub async fn list_by<T, P>(&self, predicate: P) -> Result<Vec<T>>
    where
        T: Entity,
        P: Fn(&T) -> bool,
    {
        let mut items = self.list::<T>().await?;
        items.retain(|item| predicate(item));
        Ok(items)
    }

    /// 读取实体，不存在时返回对应的 NotFound 错误
    pub async fn get<T: Entity>(&self, id: &str) -> Result<Versioned<T>> {
        self.find::<T>(id)
            .await?
            .ok_or_else(|| not_found(T::KIND, id))
    }

    /// 读取实体，不存在时返回 None
    pub async fn find<T: Entity>(&self, id: &str) -> Result<Option<Versioned<T>>> {
        self.store
            .get(T::KIND, id)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    /// 插入或整体替换
    pub async fn put<T: Entity>(&self, entity: &T) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put_with(entity, Expect::Any)?;
        self.store.commit(batch).await
    }

    /// 删除实体，不存在时返回 NotFound
    pub async fn delete<T: Entity>(&self, id: &str) -> Result<()> {
        let current = self.get::<T>(id).await?;
        let mut batch = WriteBatch::new();
        batch.delete(T::KIND, id, Expect::Version(current.version));
        self.store.commit(batch).await
    }

    /// 原子提交写批次
    pub async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.store.commit(batch).await
    }
}
