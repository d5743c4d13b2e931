//! CLI 模块
//!
//! 命令行前端，会话保存在存储中，因此连续多次调用共享同一登录状态。
//!
//! # 使用示例
//!
//! ```bash
//! # 写入演示数据
//! points-wallet seed
//!
//! # 学生登录并兑换
//! points-wallet login -e alice@student.com -p student123
//! points-wallet redeem <reward-id>
//!
//! # 管理员调整积分
//! points-wallet login -e admin@gmail.com -p admin123
//! points-wallet adjust -u <user-id> -d -20 -r "Penalty"
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
