//! 认证模块
//!
//! 提供会话令牌生成、验证和密码处理功能

mod jwt;
mod password;

pub use jwt::{IssuedToken, JwtConfig, JwtManager, SessionClaims};
pub use password::{hash_password, verify_password};
