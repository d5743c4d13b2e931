//! 实体存储层
//!
//! ## 模块结构
//!
//! - `traits`: 存储接口、写批次与前置条件
//! - `memory_store`: 进程内存储
//! - `sqlite_store`: SQLite 持久化存储
//! - `delayed_store`: 随机延迟装饰器
//! - `repository`: 类型化仓储

pub mod delayed_store;
pub mod memory_store;
pub mod repository;
pub mod sqlite_store;
pub mod traits;

pub use delayed_store::DelayedStore;
pub use memory_store::MemoryStore;
pub use repository::{EntityRepository, not_found};
pub use sqlite_store::{MIGRATOR, SqliteStore};
#[cfg(test)]
pub use traits::MockEntityStore;
pub use traits::{Entity, EntityKind, EntityStore, Expect, StoredRecord, Versioned, WriteBatch, WriteOp};
