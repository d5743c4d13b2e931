//! 数据库验证工具
//!
//! 绕过服务层直接读取 `entities` 表，验证持久化结果。

use anyhow::Result;
use sqlx::SqlitePool;

/// 数据库验证工具
pub struct DbVerifier {
    pool: SqlitePool,
}

impl DbVerifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 指定种类的记录数
    pub async fn count(&self, kind: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities WHERE kind = $1")
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// 用户记录上的缓存余额
    pub async fn stored_points(&self, user_id: &str) -> Result<i64> {
        let (points,): (i64,) = sqlx::query_as(
            "SELECT json_extract(body, '$.points') FROM entities WHERE kind = 'users' AND id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(points)
    }

    /// 用户流水合计
    pub async fn ledger_sum(&self, user_id: &str) -> Result<i64> {
        let (sum,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(json_extract(body, '$.amount')), 0)
            FROM entities
            WHERE kind = 'transactions' AND json_extract(body, '$.userId') = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(sum)
    }

    /// 奖品库存
    pub async fn reward_quantity(&self, reward_id: &str) -> Result<i64> {
        let (quantity,): (i64,) = sqlx::query_as(
            "SELECT json_extract(body, '$.quantity') FROM entities WHERE kind = 'rewards' AND id = $1",
        )
        .bind(reward_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(quantity)
    }

    /// 所有缓存余额与流水合计不一致的用户
    pub async fn inconsistent_users(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT u.id
            FROM entities u
            LEFT JOIN entities t
              ON t.kind = 'transactions' AND json_extract(t.body, '$.userId') = u.id
            WHERE u.kind = 'users'
            GROUP BY u.id, u.body
            HAVING json_extract(u.body, '$.points') != COALESCE(SUM(json_extract(t.body, '$.amount')), 0)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
