//! 测试环境设置模块
//!
//! 提供基于临时 SQLite 文件的测试环境。

mod environment;

pub use environment::TestEnvironment;
