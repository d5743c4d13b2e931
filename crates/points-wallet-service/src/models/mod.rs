//! 积分钱包领域模型
//!
//! 包含用户、奖品、流水、积分申请以及身份模块使用的内部记录

pub mod enums;
pub mod point_request;
pub mod reward;
pub mod session;
pub mod transaction;
pub mod user;

// 重新导出常用类型
pub use enums::{RequestStatus, Role, TransactionType};
pub use point_request::PointRequest;
pub use reward::{NewReward, Reward, RewardUpdate};
pub use session::{MetaFlag, Session};
pub use transaction::Transaction;
pub use user::{
    DisplayIdCounter, EmailIndexEntry, User, UserProfile, format_display_id, normalize_email,
    parse_display_seq,
};
