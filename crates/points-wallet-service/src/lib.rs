//! 学生积分钱包
//!
//! 学生通过提交积分申请获得积分，管理员审核后入账；学生可用积分兑换奖品，
//! 管理员可直接调整积分。所有余额变动都经由账本写入流水，缓存余额始终等于流水合计。
//!
//! ## 模块结构
//!
//! - `models`: 领域模型（用户、奖品、流水、积分申请、会话）
//! - `store`: 带版本号的实体存储（内存、SQLite、模拟延迟装饰器）
//! - `service`: 业务服务（账本、申请审核、兑换、目录、身份、调整、数据导入）
//! - `auth`: 密码哈希与会话 Token
//! - `app`: 按配置装配服务
//! - `cli`: 命令行前端
//! - `seed`: 演示数据

pub mod app;
pub mod auth;
pub mod cli;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod store;

pub use app::PointsWallet;
pub use error::{ErrorKind, PointsError, Result};
