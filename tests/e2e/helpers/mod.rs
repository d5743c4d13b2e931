//! 测试辅助工具模块
//!
//! 提供断言宏和底层表验证工具。

mod db_verifier;

pub use db_verifier::*;
