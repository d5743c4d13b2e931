//! SQLite 实体存储
//!
//! 所有实体存放在单表 `entities` 中，(kind, id) 唯一。
//! 提交批次时在一个数据库事务内逐条执行带版本条件的语句，
//! 任一语句影响行数不符合预期即回滚整个事务。

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{instrument, trace};

use super::traits::{EntityKind, EntityStore, Expect, StoredRecord, WriteBatch, WriteOp};
use crate::error::{PointsError, Result};

/// 嵌入的迁移脚本
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite 实体存储
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 执行迁移后返回存储实例
    pub async fn migrated(pool: SqlitePool) -> Result<Self> {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| PointsError::Internal(format!("数据库迁移失败: {}", e)))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn decode_row(kind: EntityKind, row: &sqlx::sqlite::SqliteRow) -> Result<StoredRecord> {
        let body: String = row.try_get("body")?;
        let version: i64 = row.try_get("version")?;
        Ok(StoredRecord {
            kind,
            id: row.try_get("id")?,
            version: version as u64,
            body: serde_json::from_str(&body)?,
        })
    }

    /// 在事务中执行单个写操作
    async fn apply_op(conn: &mut SqliteConnection, op: &WriteOp) -> Result<()> {
        let affected = match op {
            WriteOp::Put {
                kind,
                id,
                body,
                expect,
            } => {
                let body = serde_json::to_string(body)?;
                match expect {
                    Expect::Absent => {
                        // INSERT OR IGNORE：已存在时影响行数为 0，视为冲突
                        sqlx::query(
                            r#"
                            INSERT OR IGNORE INTO entities (kind, id, version, body)
                            VALUES ($1, $2, 1, $3)
                            "#,
                        )
                        .bind(kind.as_str())
                        .bind(id)
                        .bind(&body)
                        .execute(&mut *conn)
                        .await?
                        .rows_affected()
                    }
                    Expect::Version(version) => {
                        sqlx::query(
                            r#"
                            UPDATE entities
                            SET body = $1,
                                version = version + 1,
                                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                            WHERE kind = $2 AND id = $3 AND version = $4
                            "#,
                        )
                        .bind(&body)
                        .bind(kind.as_str())
                        .bind(id)
                        .bind(*version as i64)
                        .execute(&mut *conn)
                        .await?
                        .rows_affected()
                    }
                    Expect::Any => {
                        sqlx::query(
                            r#"
                            INSERT INTO entities (kind, id, version, body)
                            VALUES ($1, $2, 1, $3)
                            ON CONFLICT (kind, id) DO UPDATE SET
                                body = excluded.body,
                                version = entities.version + 1,
                                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                            "#,
                        )
                        .bind(kind.as_str())
                        .bind(id)
                        .bind(&body)
                        .execute(&mut *conn)
                        .await?;
                        return Ok(());
                    }
                }
            }
            WriteOp::Delete { kind, id, expect } => match expect {
                Expect::Version(version) => sqlx::query(
                    "DELETE FROM entities WHERE kind = $1 AND id = $2 AND version = $3",
                )
                .bind(kind.as_str())
                .bind(id)
                .bind(*version as i64)
                .execute(&mut *conn)
                .await?
                .rows_affected(),
                Expect::Any => {
                    sqlx::query("DELETE FROM entities WHERE kind = $1 AND id = $2")
                        .bind(kind.as_str())
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    return Ok(());
                }
                Expect::Absent => {
                    // 删除一条「必须不存在」的记录：存在即冲突
                    let exists = sqlx::query("SELECT 1 FROM entities WHERE kind = $1 AND id = $2")
                        .bind(kind.as_str())
                        .bind(id)
                        .fetch_optional(&mut *conn)
                        .await?
                        .is_some();
                    if exists { 0 } else { 1 }
                }
            },
        };

        if affected == 1 {
            Ok(())
        } else {
            trace!(kind = %op.kind(), id = %op.id(), expect = ?op.expect(), "版本校验失败");
            Err(PointsError::ConcurrencyConflict)
        }
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn list(&self, kind: EntityKind) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, body
            FROM entities
            WHERE kind = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| Self::decode_row(kind, row)).collect()
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<StoredRecord>> {
        let row = sqlx::query("SELECT id, version, body FROM entities WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::decode_row(kind, &row)).transpose()
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // BEGIN IMMEDIATE 等价语义：首条写语句即获取写锁，事务内读写不会被其他写入者穿插
        let mut tx = self.pool.begin().await?;
        for op in batch.ops() {
            // 出错时 tx 被 drop，自动回滚
            Self::apply_op(&mut *tx, op).await?;
        }
        tx.commit().await?;

        Ok(())
    }
}
