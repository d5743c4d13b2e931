//! 奖品兑换测试套件
//!
//! 扣减库存、扣减积分与写入流水在同一批次内完成。

use crate::data::*;
use crate::setup::TestEnvironment;
use points_wallet::PointsError;
use points_wallet::models::TransactionType;

#[cfg(test)]
mod normal_redemption_tests {
    use super::*;

    /// 余额 100 兑换 cost=50、quantity=3 的奖品
    #[tokio::test]
    async fn test_redeem_deducts_points_and_stock() {
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
            .adjust_points(&student.id, 100, "Starting balance", DEMO_ADMIN_ID)
            .await
            .unwrap();
        let reward = env
            .wallet
            .catalog
            .create_reward(TestRewards::stocked("Lab Notebook", 50, 3))
            .await
            .unwrap();

        let receipt = env
            .wallet
            .redemptions
            .redeem(&reward.id, &student.id)
            .await
            .unwrap();

        assert_eq!(receipt.balance, 50);
        assert_eq!(receipt.remaining_quantity, 2);
        assert_eq!(receipt.transaction.amount, -50);
        assert_eq!(receipt.transaction.kind, TransactionType::Redeem);
        assert_eq!(receipt.transaction.reason, "Redeemed: Lab Notebook");

        crate::assert_balance!(env.db, &student.id, 50);
        crate::assert_ledger_consistent!(env.db, &student.id);
        assert_eq!(env.db.reward_quantity(&reward.id).await.unwrap(), 2);
    }

    /// 兑换演示奖品
    #[tokio::test]
    async fn test_redeem_demo_movie_ticket() {
        let env = TestEnvironment::seeded().await.unwrap();
        let alice = env.user(ALICE.email).await.unwrap();
        let movie = env.reward(DemoRewards::MOVIE).await.unwrap();

        env.wallet
            .redemptions
            .redeem(&movie.id, &alice.id)
            .await
            .unwrap();

        crate::assert_balance!(env.db, &alice.id, ALICE.points - 100);
        assert_eq!(env.db.reward_quantity(&movie.id).await.unwrap(), 9);
    }
}

#[cfg(test)]
mod failed_redemption_tests {
    use super::*;

    /// 积分不足时库存、余额、流水均不变
    #[tokio::test]
    async fn test_insufficient_points_changes_nothing() {
        let env = TestEnvironment::seeded().await.unwrap();
        let charlie = env.user(CHARLIE.email).await.unwrap();
        let movie = env.reward(DemoRewards::MOVIE).await.unwrap();

        let err = env
            .wallet
            .redemptions
            .redeem(&movie.id, &charlie.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PointsError::InsufficientPoints {
                required: 100,
                available: 75
            }
        ));

        crate::assert_balance!(env.db, &charlie.id, CHARLIE.points);
        assert_eq!(env.db.reward_quantity(&movie.id).await.unwrap(), 10);
        assert_eq!(env.db.count("transactions").await.unwrap(), 5);
    }

    /// 库存为 0 与奖品不存在
    #[tokio::test]
    async fn test_out_of_stock_and_missing_reward() {
        let env = TestEnvironment::seeded().await.unwrap();
        let bob = env.user(BOB.email).await.unwrap();
        let empty = env
            .wallet
            .catalog
            .create_reward(TestRewards::stocked("Sold Out Mug", 10, 0))
            .await
            .unwrap();

        let err = env
            .wallet
            .redemptions
            .redeem(&empty.id, &bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::OutOfStock(_)));

        let err = env
            .wallet
            .redemptions
            .redeem("no-such-reward", &bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::RewardNotFound(_)));

        crate::assert_balance!(env.db, &bob.id, BOB.points);
    }
}

#[cfg(test)]
mod concurrent_redemption_tests {
    use super::*;

    /// 多名学生并发兑换最后一件，恰好一人成功
    #[tokio::test]
    async fn test_last_item_has_exactly_one_winner() {
        let env = TestEnvironment::seeded().await.unwrap();
        let reward = env
            .wallet
            .catalog
            .create_reward(TestRewards::last_item(20))
            .await
            .unwrap();

        let mut students = Vec::new();
        for request in StudentGenerator::batch(6) {
            let user = env.wallet.identity.register(request).await.unwrap().user;
            env.wallet
                .adjustments
                .adjust_points(&user.id, 50, "Race entry", DEMO_ADMIN_ID)
                .await
                .unwrap();
            students.push(user);
        }

        let handles: Vec<_> = students
            .iter()
            .map(|student| {
                let redemptions = env.wallet.redemptions.clone();
                let reward_id = reward.id.clone();
                let user_id = student.id.clone();
                tokio::spawn(async move { redemptions.redeem(&reward_id, &user_id).await })
            })
            .collect();

        let mut winners = 0;
        for result in futures::future::join_all(handles).await {
            match result.unwrap() {
                Ok(receipt) => {
                    winners += 1;
                    assert_eq!(receipt.remaining_quantity, 0);
                }
                Err(PointsError::OutOfStock(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(env.db.reward_quantity(&reward.id).await.unwrap(), 0);
        let remaining: i64 = {
            let mut total = 0;
            for student in &students {
                total += env.db.stored_points(&student.id).await.unwrap();
            }
            total
        };
        assert_eq!(remaining, 6 * 50 - 20);
        crate::assert_all_consistent!(env.db);
    }

    /// 同一学生并发兑换，余额不会被扣成负数
    #[tokio::test]
    async fn test_same_student_cannot_overspend() {
        let env = TestEnvironment::seeded().await.unwrap();
        let charlie = env.user(CHARLIE.email).await.unwrap();
        let coffee = env.reward(DemoRewards::COFFEE).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let redemptions = env.wallet.redemptions.clone();
                let reward_id = coffee.id.clone();
                let user_id = charlie.id.clone();
                tokio::spawn(async move { redemptions.redeem(&reward_id, &user_id).await })
            })
            .collect();

        let mut succeeded = 0;
        for result in futures::future::join_all(handles).await {
            match result.unwrap() {
                Ok(_) => succeeded += 1,
                Err(PointsError::InsufficientPoints { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // 75 积分只够兑换一次 50 积分的咖啡券
        assert_eq!(succeeded, 1);
        crate::assert_balance!(env.db, &charlie.id, 25);
        assert_eq!(env.db.reward_quantity(&coffee.id).await.unwrap(), 19);
        crate::assert_ledger_consistent!(env.db, &charlie.id);
    }
}
