//! 数据一致性测试套件
//!
//! 混合并发操作后，缓存余额与流水合计一致，库存不为负。

use crate::data::*;
use crate::setup::TestEnvironment;
use points_wallet::PointsError;

#[cfg(test)]
mod consistency_tests {
    use super::*;

    /// 并发执行申请审核、兑换与调整后全库一致
    #[tokio::test]
    async fn test_mixed_workload_keeps_ledger_consistent() {
        let env = TestEnvironment::seeded().await.unwrap();
        let alice = env.user(ALICE.email).await.unwrap();
        let bob = env.user(BOB.email).await.unwrap();
        let coffee = env.reward(DemoRewards::COFFEE).await.unwrap();

        let mut request_ids = Vec::new();
        for _ in 0..4 {
            let request = env
                .wallet
                .requests
                .submit(&alice.id, AmountGenerator::positive(5, 30), "Volunteering")
                .await
                .unwrap();
            request_ids.push(request.id);
        }

        let mut handles = Vec::new();
        for request_id in request_ids {
            let requests = env.wallet.requests.clone();
            handles.push(tokio::spawn(async move {
                requests.approve(&request_id, DEMO_ADMIN_ID).await.map(|_| ())
            }));
        }
        for user_id in [alice.id.clone(), bob.id.clone(), alice.id.clone()] {
            let redemptions = env.wallet.redemptions.clone();
            let reward_id = coffee.id.clone();
            handles.push(tokio::spawn(async move {
                redemptions.redeem(&reward_id, &user_id).await.map(|_| ())
            }));
        }
        for delta in [15, -5, 40] {
            let adjustments = env.wallet.adjustments.clone();
            let user_id = bob.id.clone();
            handles.push(tokio::spawn(async move {
                adjustments
                    .adjust_points(&user_id, delta, "Mixed workload", DEMO_ADMIN_ID)
                    .await
                    .map(|_| ())
            }));
        }

        for result in futures::future::join_all(handles).await {
            match result.unwrap() {
                Ok(()) | Err(PointsError::InsufficientPoints { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        crate::assert_all_consistent!(env.db);
        assert!(env.wallet.ledger.reconcile().await.unwrap().is_empty());
        assert!(env.db.reward_quantity(&coffee.id).await.unwrap() >= 17);
    }

    /// 数据在重新打开后保留
    #[tokio::test]
    async fn test_state_survives_reopen() {
        let env = TestEnvironment::seeded().await.unwrap();
        let alice = env.user(ALICE.email).await.unwrap();
        let movie = env.reward(DemoRewards::MOVIE).await.unwrap();
        env.wallet
            .redemptions
            .redeem(&movie.id, &alice.id)
            .await
            .unwrap();

        let reopened = env.reopen().await.unwrap();
        assert_eq!(reopened.ledger.balance(&alice.id).await.unwrap(), ALICE.points - 100);
        assert_eq!(reopened.catalog.get_reward(&movie.id).await.unwrap().quantity, 9);

        // 演示数据只写入一次
        assert!(reopened.migration.seed_demo_data().await.unwrap().is_none());
        assert_eq!(env.db.count("users").await.unwrap(), 4);
    }

    /// 重置清空所有数据后恢复演示数据
    #[tokio::test]
    async fn test_reset_restores_demo_state() {
        let env = TestEnvironment::seeded().await.unwrap();
        env.wallet
            .identity
            .register(StudentGenerator::register_request())
            .await
            .unwrap();
        env.wallet
            .catalog
            .create_reward(TestRewards::stocked("Extra Prize", 5, 5))
            .await
            .unwrap();

        let report = env.wallet.migration.reset().await.unwrap();
        assert_eq!(report.users_imported, 4);

        assert_eq!(env.db.count("users").await.unwrap(), 4);
        assert_eq!(env.db.count("rewards").await.unwrap(), 3);
        assert_eq!(env.db.count("transactions").await.unwrap(), 5);
        assert_eq!(env.db.count("sessions").await.unwrap(), 0);
        crate::assert_all_consistent!(env.db);
    }
}
