//! 测试套件模块
//!
//! 按业务功能组织的测试用例集合。

pub mod admin_adjustment;
pub mod data_consistency;
pub mod identity;
pub mod redemption;
pub mod request_workflow;
