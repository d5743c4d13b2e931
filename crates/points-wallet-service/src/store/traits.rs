//! 实体存储 Trait 定义
//!
//! 存储层只认识「种类 + ID + 版本 + JSON 文档」，不包含业务逻辑。
//! 所有写入都通过 [`WriteBatch`] 提交：批内每个写操作都带有版本期望，
//! 任一期望不满足则整批放弃，调用方据此实现乐观并发控制。

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// 实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Reward,
    Transaction,
    PointRequest,
    /// 邮箱唯一索引
    EmailIndex,
    /// 展示编号预留计数器
    Counter,
    /// 当前会话
    Session,
    /// 系统标记（如初始化数据已写入）
    Meta,
}

impl EntityKind {
    /// 所有种类，重置数据时按此顺序清理
    pub const ALL: [EntityKind; 8] = [
        Self::Transaction,
        Self::PointRequest,
        Self::Reward,
        Self::Session,
        Self::EmailIndex,
        Self::Counter,
        Self::User,
        Self::Meta,
    ];

    /// 持久化使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Reward => "rewards",
            Self::Transaction => "transactions",
            Self::PointRequest => "point_requests",
            Self::EmailIndex => "email_index",
            Self::Counter => "counters",
            Self::Session => "sessions",
            Self::Meta => "meta",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可持久化的实体
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn entity_id(&self) -> &str;
}

/// 存储中的原始记录
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: EntityKind,
    pub id: String,
    /// 每次写入递增，新插入记录版本为 1
    pub version: u64,
    pub body: serde_json::Value,
}

/// 带版本号的实体
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// 写入前置条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// 无条件写入
    Any,
    /// 记录必须不存在
    Absent,
    /// 记录必须存在且版本一致
    Version(u64),
}

/// 单个写操作
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put {
        kind: EntityKind,
        id: String,
        body: serde_json::Value,
        expect: Expect,
    },
    Delete {
        kind: EntityKind,
        id: String,
        expect: Expect,
    },
}

impl WriteOp {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Put { kind, .. } | Self::Delete { kind, .. } => *kind,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Put { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    pub fn expect(&self) -> Expect {
        match self {
            Self::Put { expect, .. } | Self::Delete { expect, .. } => *expect,
        }
    }
}

/// 原子写批次
///
/// 一个批次对应一个业务操作的全部写入，要么全部生效，要么全部不生效
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入新实体（要求不存在）
    pub fn insert<T: Entity>(&mut self, entity: &T) -> Result<&mut Self> {
        self.put_with(entity, Expect::Absent)
    }

    /// 基于已读取的版本更新实体
    pub fn update<T: Entity>(&mut self, entity: &T, version: u64) -> Result<&mut Self> {
        self.put_with(entity, Expect::Version(version))
    }

    /// 按指定前置条件写入实体
    pub fn put_with<T: Entity>(&mut self, entity: &T, expect: Expect) -> Result<&mut Self> {
        self.ops.push(WriteOp::Put {
            kind: T::KIND,
            id: entity.entity_id().to_string(),
            body: serde_json::to_value(entity)?,
            expect,
        });
        Ok(self)
    }

    /// 删除实体
    pub fn delete(&mut self, kind: EntityKind, id: impl Into<String>, expect: Expect) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            kind,
            id: id.into(),
            expect,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// 实体存储接口
///
/// 实现必须保证 `commit` 的原子性：批内任一前置条件不满足时返回
/// `PointsError::ConcurrencyConflict`，且不产生任何写入
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 按插入顺序列出某一种类的全部记录
    async fn list(&self, kind: EntityKind) -> Result<Vec<StoredRecord>>;

    /// 读取单条记录
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<StoredRecord>>;

    /// 原子提交写批次
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}
