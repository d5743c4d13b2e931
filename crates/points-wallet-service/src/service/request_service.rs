//! 积分申请审核服务
//!
//! 学生提交申请，管理员审核。状态机只允许 PENDING -> APPROVED / REJECTED。
//!
//! ## 审核流程
//!
//! 1. 读取申请（带版本） -> 2. 校验状态 -> 3. 通过时读取用户并暂存记账
//!    -> 4. 状态更新与记账同批提交（冲突时整体重试）

use tracing::{info, instrument, warn};

use points_shared::observability::metrics;
use points_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{PointsError, Result};
use crate::models::{PointRequest, RequestStatus, User};
use crate::service::ledger_service::LedgerService;
use crate::store::{EntityRepository, WriteBatch};

/// 积分申请审核服务
#[derive(Clone)]
pub struct RequestService {
    repo: EntityRepository,
    retry: RetryPolicy,
}

impl RequestService {
    pub fn new(repo: EntityRepository, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    /// 提交积分申请
    ///
    /// 金额必须大于 0，理由去除空白后不能为空
    #[instrument(skip(self, reason), fields(user_id = %user_id, amount))]
    pub async fn submit(&self, user_id: &str, amount: i64, reason: &str) -> Result<PointRequest> {
        if amount <= 0 {
            return Err(PointsError::InvalidRequest(format!(
                "申请积分必须大于 0: {}",
                amount
            )));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PointsError::InvalidRequest("申请理由不能为空".to_string()));
        }

        let user = self.repo.get::<User>(user_id).await?.into_inner();
        let request = PointRequest::new(&user.id, &user.name, amount, reason);

        let mut batch = WriteBatch::new();
        batch.insert(&request)?;
        self.repo.commit(batch).await?;

        metrics::record_point_request(RequestStatus::Pending.as_str());
        info!(request_id = %request.id, "积分申请已提交");
        Ok(request)
    }

    /// 通过申请并入账
    #[instrument(skip(self), fields(request_id = %request_id, admin_id = %admin_id))]
    pub async fn approve(&self, request_id: &str, admin_id: &str) -> Result<PointRequest> {
        self.review(request_id, admin_id, RequestStatus::Approved)
            .await
    }

    /// 拒绝申请，无账务影响
    #[instrument(skip(self), fields(request_id = %request_id, admin_id = %admin_id))]
    pub async fn reject(&self, request_id: &str, admin_id: &str) -> Result<PointRequest> {
        self.review(request_id, admin_id, RequestStatus::Rejected)
            .await
    }

    async fn review(
        &self,
        request_id: &str,
        admin_id: &str,
        decision: RequestStatus,
    ) -> Result<PointRequest> {
        let result = retry_with_policy(
            &self.retry,
            "review_point_request",
            PointsError::is_retryable,
            || self.try_review(request_id, admin_id, decision),
        )
        .await;

        match &result {
            Ok(request) => {
                metrics::record_point_request(request.status.as_str());
                info!(status = %request.status, amount = request.amount, "积分申请已审核");
            }
            Err(e) => warn!(error = %e, "积分申请审核失败"),
        }
        result
    }

    async fn try_review(
        &self,
        request_id: &str,
        admin_id: &str,
        decision: RequestStatus,
    ) -> Result<PointRequest> {
        let current = self.repo.get::<PointRequest>(request_id).await?;
        let mut request = current.value.clone();
        request.review(decision, admin_id)?;

        let mut batch = WriteBatch::new();
        batch.update(&request, current.version)?;

        let staged = if decision == RequestStatus::Approved {
            let user = self.repo.get::<User>(&request.user_id).await?;
            let (transaction, _) = LedgerService::stage_transaction(
                &mut batch,
                &user,
                request.amount,
                &request.reason,
            )?;
            Some(transaction)
        } else {
            None
        };

        self.repo.commit(batch).await?;
        if let Some(transaction) = &staged {
            LedgerService::note_committed(transaction);
        }

        Ok(request)
    }

    /// 查询单个申请
    pub async fn get(&self, request_id: &str) -> Result<PointRequest> {
        Ok(self.repo.get::<PointRequest>(request_id).await?.into_inner())
    }

    /// 全部申请（提交时间倒序）
    pub async fn list_all(&self) -> Result<Vec<PointRequest>> {
        Ok(newest_first(self.repo.list::<PointRequest>().await?))
    }

    /// 某个用户的申请（提交时间倒序）
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PointRequest>> {
        let requests = self
            .repo
            .list_by::<PointRequest, _>(|r| r.user_id == user_id)
            .await?;
        Ok(newest_first(requests))
    }

    /// 待审核申请（先提交的在前）
    pub async fn list_pending(&self) -> Result<Vec<PointRequest>> {
        self.repo
            .list_by::<PointRequest, _>(|r| r.status == RequestStatus::Pending)
            .await
    }
}

fn newest_first(mut requests: Vec<PointRequest>) -> Vec<PointRequest> {
    requests.reverse();
    requests.sort_by(|a, b| b.request_date.cmp(&a.request_date));
    requests
}
