//! 管理员积分调整
//!
//! 绕过申请流程直接加减积分。不设上下限，余额允许为负。

use tracing::{info, instrument};

use crate::error::{PointsError, Result};
use crate::models::UserProfile;
use crate::service::ledger_service::LedgerService;

/// 调整流水的理由前缀
pub const ADJUSTMENT_PREFIX: &str = "Admin adjustment: ";

/// 管理员积分调整服务
#[derive(Clone)]
pub struct AdjustmentService {
    ledger: LedgerService,
}

impl AdjustmentService {
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    /// 调整用户积分
    ///
    /// 通过账本记一笔带前缀理由的流水，余额只变动一次
    #[instrument(skip(self, reason), fields(user_id = %user_id, delta, admin_id = %admin_id))]
    pub async fn adjust_points(
        &self,
        user_id: &str,
        delta: i64,
        reason: &str,
        admin_id: &str,
    ) -> Result<UserProfile> {
        if delta == 0 {
            return Err(PointsError::InvalidRequest("调整积分不能为 0".to_string()));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PointsError::InvalidRequest("调整理由不能为空".to_string()));
        }

        let posting = self
            .ledger
            .post(user_id, delta, &format!("{}{}", ADJUSTMENT_PREFIX, reason))
            .await?;

        info!(
            transaction_id = %posting.transaction.id,
            balance = posting.user.points,
            "管理员已调整积分"
        );
        Ok(posting.user)
    }
}
