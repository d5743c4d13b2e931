//! 积分钱包服务错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

use crate::models::RequestStatus;

/// 错误分类
///
/// 调用方（命令行 / UI 层）据此决定提示方式，而不必逐个匹配变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    Conflict,
    Unauthorized,
    Internal,
}

/// 积分钱包服务错误类型
#[derive(Debug, Error)]
pub enum PointsError {
    // === 实体不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("奖品不存在: {0}")]
    RewardNotFound(String),

    #[error("积分申请不存在: {0}")]
    RequestNotFound(String),

    // === 参数错误 ===
    #[error("参数校验失败: {0}")]
    InvalidRequest(String),

    // === 状态冲突 ===
    #[error("积分申请已审核: request_id={request_id}, status={status}")]
    AlreadyReviewed {
        request_id: String,
        status: RequestStatus,
    },

    #[error("奖品库存不足: reward_id={0}")]
    OutOfStock(String),

    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("邮箱已被注册: {0}")]
    EmailAlreadyInUse(String),

    #[error("并发冲突，请重试")]
    ConcurrencyConflict,

    // === 认证 ===
    #[error("邮箱或密码错误")]
    InvalidCredentials,

    #[error("未授权: {0}")]
    Unauthorized(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分钱包服务 Result 类型别名
pub type Result<T> = std::result::Result<T, PointsError>;

impl PointsError {
    /// 错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::RewardNotFound(_) | Self::RequestNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::AlreadyReviewed { .. }
            | Self::OutOfStock(_)
            | Self::InsufficientPoints { .. }
            | Self::EmailAlreadyInUse(_)
            | Self::ConcurrencyConflict => ErrorKind::Conflict,
            Self::InvalidCredentials | Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 检查是否为可重试的错误
    ///
    /// 只有版本冲突和瞬时数据库故障值得重新执行整个操作
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrencyConflict => true,
            Self::Database(err) => points_shared::error::is_transient_db_error(err),
            _ => false,
        }
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal) && !matches!(self, Self::ConcurrencyConflict)
    }

    /// 获取错误码（用于命令行输出）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::AlreadyReviewed { .. } => "ALREADY_REVIEWED",
            Self::OutOfStock(_) => "OUT_OF_STOCK",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::EmailAlreadyInUse(_) => "EMAIL_ALREADY_IN_USE",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for PointsError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::InvalidRequest(errors.to_string())
    }
}

impl From<points_shared::error::SharedError> for PointsError {
    fn from(err: points_shared::error::SharedError) -> Self {
        use points_shared::error::SharedError;
        match err {
            SharedError::Database(e) => Self::Database(e),
            SharedError::Validation(msg) => Self::InvalidRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
