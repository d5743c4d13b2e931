//! 注册、登录与会话测试套件

use crate::data::*;
use crate::setup::TestEnvironment;
use points_wallet::PointsError;
use points_wallet::models::Role;
use points_wallet::service::RegisterRequest;

#[cfg(test)]
mod registration_tests {
    use super::*;

    /// 新学生编号接在演示数据之后
    #[tokio::test]
    async fn test_register_assigns_next_display_id() {
        let env = TestEnvironment::seeded().await.unwrap();

        let session = env
            .wallet
            .identity
            .register(RegisterRequest {
                email: "Dana@Student.com".into(),
                password: "secret123".into(),
                name: "Dana Lee".into(),
                phone: "+1234567893".into(),
                role: Role::Student,
            })
            .await
            .unwrap();

        assert_eq!(session.user.display_id, "STU004");
        assert_eq!(session.user.email, "dana@student.com");
        assert_eq!(session.user.points, 0);

        let current = env.wallet.identity.current_session().await.unwrap().unwrap();
        assert_eq!(current.id, session.user.id);
    }

    /// 邮箱大小写不敏感地唯一
    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let env = TestEnvironment::seeded().await.unwrap();

        let err = env
            .wallet
            .identity
            .register(RegisterRequest {
                email: "ALICE@student.com".into(),
                password: "secret123".into(),
                name: "Alice Again".into(),
                phone: String::new(),
                role: Role::Student,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PointsError::EmailAlreadyInUse(_)));
        assert_eq!(env.db.count("users").await.unwrap(), 4);
    }

    /// 并发注册的编号互不重复
    #[tokio::test]
    async fn test_concurrent_registrations_get_unique_ids() {
        let env = TestEnvironment::seeded().await.unwrap();

        let handles: Vec<_> = StudentGenerator::batch(8)
            .into_iter()
            .map(|request| {
                let identity = env.wallet.identity.clone();
                tokio::spawn(async move { identity.register(request).await })
            })
            .collect();

        let mut display_ids: Vec<String> = Vec::new();
        for result in futures::future::join_all(handles).await {
            display_ids.push(result.unwrap().unwrap().user.display_id);
        }
        display_ids.sort();
        display_ids.dedup();
        assert_eq!(display_ids.len(), 8);
        assert_eq!(display_ids.first().map(String::as_str), Some("STU004"));
        assert_eq!(display_ids.last().map(String::as_str), Some("STU011"));
    }

    /// 管理员编号独立计数
    #[tokio::test]
    async fn test_admin_registration_uses_admin_prefix() {
        let env = TestEnvironment::seeded().await.unwrap();
        let mut request = StudentGenerator::register_request();
        request.role = Role::Admin;

        let session = env.wallet.identity.register(request).await.unwrap();
        assert_eq!(session.user.display_id, "ADMIN002");
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_logout_roundtrip() {
        let env = TestEnvironment::seeded().await.unwrap();
        assert!(env.wallet.identity.current_session().await.unwrap().is_none());

        let session = env
            .wallet
            .identity
            .authenticate(ADMIN.email, ADMIN.password)
            .await
            .unwrap();
        assert_eq!(session.user.id, DEMO_ADMIN_ID);
        assert_eq!(session.user.display_id, ADMIN.display_id);
        assert_eq!(session.user.role, Role::Admin);

        // 会话持久化在存储中，重新打开后仍然有效
        let reopened = env.reopen().await.unwrap();
        let current = reopened.identity.current_session().await.unwrap().unwrap();
        assert_eq!(current.id, DEMO_ADMIN_ID);

        reopened.identity.end_session().await.unwrap();
        assert!(env.wallet.identity.current_session().await.unwrap().is_none());
        assert_eq!(env.db.count("sessions").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let env = TestEnvironment::seeded().await.unwrap();

        let wrong_password = env
            .wallet
            .identity
            .authenticate(BOB.email, "not-it")
            .await
            .unwrap_err();
        let unknown = env
            .wallet
            .identity
            .authenticate("nobody@student.com", "student123")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, PointsError::InvalidCredentials));
        assert!(matches!(unknown, PointsError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    /// 会话中的余额总是最新值
    #[tokio::test]
    async fn test_session_reflects_latest_balance() {
        let env = TestEnvironment::seeded().await.unwrap();
        let session = env
            .wallet
            .identity
            .authenticate(CHARLIE.email, CHARLIE.password)
            .await
            .unwrap();

        env.wallet
            .adjustments
            .adjust_points(&session.user.id, 5, "Quiz winner", DEMO_ADMIN_ID)
            .await
            .unwrap();

        let current = env.wallet.identity.current_session().await.unwrap().unwrap();
        assert_eq!(current.points, CHARLIE.points + 5);
    }
}
