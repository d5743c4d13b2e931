//! 服务层
//!
//! 实现积分钱包业务逻辑，协调仓储层。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `ledger_service`: 积分账本（余额变动唯一入口）
//! - `request_service`: 积分申请提交与审核
//! - `redemption_service`: 奖品兑换
//! - `catalog_service`: 奖品目录维护
//! - `identity_service`: 注册、登录与会话
//! - `adjustment_service`: 管理员积分调整
//! - `migration_service`: 旧版数据导入、演示数据与重置

pub mod adjustment_service;
pub mod catalog_service;
pub mod dto;
pub mod identity_service;
pub mod ledger_service;
pub mod migration_service;
pub mod redemption_service;
pub mod request_service;

pub use adjustment_service::{ADJUSTMENT_PREFIX, AdjustmentService};
pub use catalog_service::CatalogService;
pub use dto::*;
pub use identity_service::IdentityService;
pub use ledger_service::LedgerService;
pub use migration_service::{LegacySnapshot, LegacyUser, MigrationService, OPENING_BALANCE_REASON};
pub use redemption_service::{RedemptionService, redemption_reason};
pub use request_service::RequestService;
