//! 积分申请流程测试套件
//!
//! 学生提交申请，管理员通过或拒绝。

use crate::data::*;
use crate::setup::TestEnvironment;
use points_wallet::PointsError;
use points_wallet::models::{RequestStatus, TransactionType};

#[cfg(test)]
mod approval_tests {
    use super::*;

    /// 提交 30 积分申请并通过
    ///
    /// 1. 学生提交申请，状态为 PENDING
    /// 2. 管理员通过，记录审核人
    /// 3. 追加一条 +30 流水，余额增加 30
    #[tokio::test]
    async fn test_submit_and_approve_credits_student() {
        let env = TestEnvironment::seeded().await.unwrap();
        let charlie = env.user(CHARLIE.email).await.unwrap();

        let request = env
            .wallet
            .requests
            .submit(&charlie.id, 30, "Workshop")
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.user_name, "Charlie Davis");
        crate::assert_balance!(env.db, &charlie.id, CHARLIE.points);

        let approved = env
            .wallet
            .requests
            .approve(&request.id, DEMO_ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.reviewed_by.as_deref(), Some(DEMO_ADMIN_ID));
        assert!(approved.review_date.is_some());

        crate::assert_balance!(env.db, &charlie.id, CHARLIE.points + 30);
        crate::assert_ledger_consistent!(env.db, &charlie.id);

        let history = env
            .wallet
            .ledger
            .transactions_for_user(&charlie.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 30);
        assert_eq!(history[0].reason, "Workshop");
        assert_eq!(history[0].kind, TransactionType::Earn);
    }

    /// 拒绝不产生流水，余额不变
    #[tokio::test]
    async fn test_reject_leaves_balance_untouched() {
        let env = TestEnvironment::seeded().await.unwrap();
        let bob = env.user(BOB.email).await.unwrap();

        let request = env
            .wallet
            .requests
            .submit(&bob.id, 500, "Won hackathon")
            .await
            .unwrap();
        let rejected = env
            .wallet
            .requests
            .reject(&request.id, DEMO_ADMIN_ID)
            .await
            .unwrap();

        assert_eq!(rejected.status, RequestStatus::Rejected);
        crate::assert_balance!(env.db, &bob.id, BOB.points);
        assert_eq!(env.db.count("transactions").await.unwrap(), 5);
    }
}

#[cfg(test)]
mod terminal_state_tests {
    use super::*;

    /// 已审核的申请再次审核返回 AlreadyReviewed，且不重复入账
    #[tokio::test]
    async fn test_second_review_is_rejected() {
        let env = TestEnvironment::seeded().await.unwrap();
        let alice = env.user(ALICE.email).await.unwrap();

        let request = env
            .wallet
            .requests
            .submit(&alice.id, 40, "Tutoring")
            .await
            .unwrap();
        env.wallet
            .requests
            .approve(&request.id, DEMO_ADMIN_ID)
            .await
            .unwrap();

        let again = env.wallet.requests.approve(&request.id, DEMO_ADMIN_ID).await;
        let reversed = env.wallet.requests.reject(&request.id, DEMO_ADMIN_ID).await;
        for result in [again, reversed] {
            let err = result.unwrap_err();
            assert!(
                matches!(
                    err,
                    PointsError::AlreadyReviewed {
                        status: RequestStatus::Approved,
                        ..
                    }
                ),
                "unexpected error: {err}"
            );
        }

        crate::assert_balance!(env.db, &alice.id, ALICE.points + 40);
        let stored = env.wallet.requests.get(&request.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
    }

    /// 并发通过与拒绝同一申请，只有一方生效
    #[tokio::test]
    async fn test_concurrent_reviews_apply_once() {
        let env = TestEnvironment::seeded().await.unwrap();
        let bob = env.user(BOB.email).await.unwrap();
        let request = env
            .wallet
            .requests
            .submit(&bob.id, 25, "Peer mentoring")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..6 {
            let requests = env.wallet.requests.clone();
            let request_id = request.id.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    requests.approve(&request_id, DEMO_ADMIN_ID).await
                } else {
                    requests.reject(&request_id, DEMO_ADMIN_ID).await
                }
            }));
        }

        let results = futures::future::join_all(handles).await;
        let succeeded: Vec<_> = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter_map(|r| match r {
                Ok(request) => Some(request),
                Err(PointsError::AlreadyReviewed { .. }) => None,
                Err(e) => panic!("unexpected error: {e}"),
            })
            .collect();
        assert_eq!(succeeded.len(), 1);

        let expected = match succeeded[0].status {
            RequestStatus::Approved => BOB.points + 25,
            _ => BOB.points,
        };
        crate::assert_balance!(env.db, &bob.id, expected);
        crate::assert_ledger_consistent!(env.db, &bob.id);
    }

    /// 非法申请参数
    #[tokio::test]
    async fn test_invalid_submissions() {
        let env = TestEnvironment::seeded().await.unwrap();
        let alice = env.user(ALICE.email).await.unwrap();

        for (amount, reason) in [(0, "Nothing"), (-5, "Negative"), (10, "   ")] {
            let err = env
                .wallet
                .requests
                .submit(&alice.id, amount, reason)
                .await
                .unwrap_err();
            assert!(matches!(err, PointsError::InvalidRequest(_)));
        }

        let err = env
            .wallet
            .requests
            .submit("ghost", 10, "Workshop")
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::UserNotFound(_)));
        assert_eq!(env.db.count("point_requests").await.unwrap(), 0);
    }
}
