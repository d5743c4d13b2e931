//! 积分钱包端到端测试
//!
//! 基于临时目录中的 SQLite 文件存储，覆盖完整业务流程：
//! - 积分申请提交与审核
//! - 奖品兑换（含并发抢兑最后一件）
//! - 管理员积分调整
//! - 注册、登录与会话
//! - 旧版数据导入
//! - 缓存余额与流水的一致性

pub mod helpers;
pub mod setup;
pub mod suites;

pub use setup::TestEnvironment;
