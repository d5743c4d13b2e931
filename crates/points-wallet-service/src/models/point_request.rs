//! 积分申请实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RequestStatus;
use crate::error::{PointsError, Result};
use crate::store::{Entity, EntityKind};

/// 积分申请
///
/// 学生提交后处于 PENDING，由管理员审核为 APPROVED 或 REJECTED，之后不再变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRequest {
    pub id: String,
    pub user_id: String,
    /// 提交时的用户名快照
    pub user_name: String,
    pub amount: i64,
    pub reason: String,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<DateTime<Utc>>,
    /// 审核管理员 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
}

impl PointRequest {
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        amount: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            amount,
            reason: reason.into(),
            status: RequestStatus::Pending,
            request_date: Utc::now(),
            review_date: None,
            reviewed_by: None,
        }
    }

    /// 审核申请
    ///
    /// 非 PENDING 状态返回 `AlreadyReviewed`，原记录保持不变
    pub fn review(&mut self, next: RequestStatus, admin_id: &str) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PointsError::AlreadyReviewed {
                request_id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = next;
        self.review_date = Some(Utc::now());
        self.reviewed_by = Some(admin_id.to_string());
        Ok(())
    }
}

impl Entity for PointRequest {
    const KIND: EntityKind = EntityKind::PointRequest;

    fn entity_id(&self) -> &str {
        &self.id
    }
}
