//! 内存存储
//!
//! 基于 `parking_lot::RwLock` 的进程内实现，适用于测试和演示环境。
//! 提交时在同一把写锁内完成校验和写入，因此批次天然原子。

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use super::traits::{EntityKind, EntityStore, Expect, StoredRecord, WriteBatch, WriteOp};
use crate::error::{PointsError, Result};

type Key = (EntityKind, String);

#[derive(Debug, Clone)]
struct MemRecord {
    seq: u64,
    version: u64,
    body: serde_json::Value,
}

#[derive(Debug, Default)]
struct MemState {
    records: HashMap<Key, MemRecord>,
    next_seq: u64,
}

/// 内存实体存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录总数（所有种类）
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 校验单个前置条件
///
/// `current` 为批内此前操作生效后的版本（None 表示不存在）
fn check_expectation(op: &WriteOp, current: Option<u64>) -> Result<()> {
    let ok = match (op.expect(), current) {
        (Expect::Any, _) => true,
        (Expect::Absent, None) => true,
        (Expect::Version(expected), Some(actual)) => expected == actual,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        trace!(kind = %op.kind(), id = %op.id(), expect = ?op.expect(), current = ?current, "版本校验失败");
        Err(PointsError::ConcurrencyConflict)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn list(&self, kind: EntityKind) -> Result<Vec<StoredRecord>> {
        let state = self.state.read();
        let mut rows: Vec<(&Key, &MemRecord)> =
            state.records.iter().filter(|((k, _), _)| *k == kind).collect();
        rows.sort_by_key(|(_, r)| r.seq);

        Ok(rows
            .into_iter()
            .map(|((kind, id), r)| StoredRecord {
                kind: *kind,
                id: id.clone(),
                version: r.version,
                body: r.body.clone(),
            })
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<StoredRecord>> {
        let state = self.state.read();
        Ok(state
            .records
            .get(&(kind, id.to_string()))
            .map(|r| StoredRecord {
                kind,
                id: id.to_string(),
                version: r.version,
                body: r.body.clone(),
            }))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut state = self.state.write();

        // 1. 校验：批内对同一记录的多次操作按顺序叠加
        let mut overlay: HashMap<Key, Option<u64>> = HashMap::new();
        for op in batch.ops() {
            let key = (op.kind(), op.id().to_string());
            let current = match overlay.get(&key) {
                Some(v) => *v,
                None => state.records.get(&key).map(|r| r.version),
            };
            check_expectation(op, current)?;

            let next = match op {
                WriteOp::Put { .. } => Some(current.map_or(1, |v| v + 1)),
                WriteOp::Delete { .. } => None,
            };
            overlay.insert(key, next);
        }

        // 2. 写入
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { kind, id, body, .. } => {
                    let key = (kind, id);
                    if let Some(existing) = state.records.get_mut(&key) {
                        existing.version += 1;
                        existing.body = body;
                    } else {
                        state.next_seq += 1;
                        let seq = state.next_seq;
                        state.records.insert(
                            key,
                            MemRecord {
                                seq,
                                version: 1,
                                body,
                            },
                        );
                    }
                }
                WriteOp::Delete { kind, id, .. } => {
                    state.records.remove(&(kind, id));
                }
            }
        }

        Ok(())
    }
}
