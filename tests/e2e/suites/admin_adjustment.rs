//! 管理员积分调整测试套件

use crate::data::*;
use crate::setup::TestEnvironment;
use points_wallet::PointsError;
use points_wallet::models::TransactionType;

#[cfg(test)]
mod adjustment_tests {
    use super::*;

    /// 余额 10 调整 -20，结果为 -10，不设下限
    #[tokio::test]
    async fn test_penalty_may_drive_balance_negative() {
        let env = TestEnvironment::seeded().await.unwrap();
        let student = env
            .wallet
            .identity
            .register(StudentGenerator::register_request())
            .await
            .unwrap()
            .user;
        env.wallet
            .adjustments
            .adjust_points(&student.id, 10, "Welcome bonus", DEMO_ADMIN_ID)
            .await
            .unwrap();

        let profile = env
            .wallet
            .adjustments
            .adjust_points(&student.id, -20, "Penalty", DEMO_ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(profile.points, -10);

        crate::assert_balance!(env.db, &student.id, -10);
        crate::assert_ledger_consistent!(env.db, &student.id);

        let history = env
            .wallet
            .ledger
            .transactions_for_user(&student.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, -20);
        assert_eq!(history[0].kind, TransactionType::Redeem);
        assert!(history[0].reason.ends_with("Penalty"));
    }

    /// 并发调整全部生效
    #[tokio::test]
    async fn test_concurrent_adjustments_all_apply() {
        let env = TestEnvironment::seeded().await.unwrap();
        let bob = env.user(BOB.email).await.unwrap();

        let deltas: Vec<i64> = (0..8).map(|_| AmountGenerator::positive(1, 40)).collect();
        let handles: Vec<_> = deltas
            .iter()
            .map(|&delta| {
                let adjustments = env.wallet.adjustments.clone();
                let user_id = bob.id.clone();
                tokio::spawn(async move {
                    adjustments
                        .adjust_points(&user_id, delta, "Event helper", DEMO_ADMIN_ID)
                        .await
                })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let total: i64 = deltas.iter().sum();
        crate::assert_balance!(env.db, &bob.id, BOB.points + total);
        crate::assert_ledger_consistent!(env.db, &bob.id);
    }

    #[tokio::test]
    async fn test_zero_delta_and_unknown_user_rejected() {
        let env = TestEnvironment::seeded().await.unwrap();
        let alice = env.user(ALICE.email).await.unwrap();

        let err = env
            .wallet
            .adjustments
            .adjust_points(&alice.id, 0, "Noop", DEMO_ADMIN_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::InvalidRequest(_)));

        let err = env
            .wallet
            .adjustments
            .adjust_points("ghost", 5, "Bonus", DEMO_ADMIN_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::UserNotFound(_)));

        assert_eq!(env.db.count("transactions").await.unwrap(), 5);
    }
}
