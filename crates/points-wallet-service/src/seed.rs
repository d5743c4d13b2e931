//! 演示数据
//!
//! 三名学生、一名管理员、三个奖品和五条历史流水。
//! 学生密码均为 `student123`，管理员 `admin-001` 密码为 `admin123`。

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::{Reward, Role, Transaction, TransactionType};
use crate::service::migration_service::{LegacySnapshot, LegacyUser};

/// 固定的演示管理员 ID
pub const DEMO_ADMIN_ID: &str = "admin-001";

fn student(name: &str, display_id: &str, email: &str, phone: &str, points: i64) -> LegacyUser {
    LegacyUser {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        student_id: display_id.to_string(),
        role: Role::Student,
        email: email.to_string(),
        phone: phone.to_string(),
        points,
        password: "student123".to_string(),
    }
}

fn reward(title: &str, cost: i64, quantity: i64, description: &str) -> Reward {
    Reward {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        cost,
        quantity,
        description: description.to_string(),
    }
}

fn earned(user: &LegacyUser, amount: i64, reason: &str, days_ago: i64) -> Transaction {
    Transaction {
        date: Utc::now() - Duration::days(days_ago),
        kind: TransactionType::Earn,
        ..Transaction::new(&user.id, amount, reason)
    }
}

/// 生成演示数据快照
///
/// 学生 ID 和奖品 ID 每次随机生成，各学生缓存余额与流水合计一致
pub fn demo_snapshot() -> LegacySnapshot {
    let alice = student("Alice Johnson", "STU001", "alice@student.com", "+1234567890", 150);
    let bob = student("Bob Smith", "STU002", "bob@student.com", "+1234567891", 200);
    let charlie = student("Charlie Davis", "STU003", "charlie@student.com", "+1234567892", 75);
    let admin = LegacyUser {
        id: DEMO_ADMIN_ID.to_string(),
        name: "Admin User".to_string(),
        student_id: "ADMIN001".to_string(),
        role: Role::Admin,
        email: "admin@gmail.com".to_string(),
        phone: "+1234567899".to_string(),
        points: 0,
        password: "admin123".to_string(),
    };

    let transactions = vec![
        earned(&alice, 50, "Attended workshop on AI", 7),
        earned(&alice, 100, "Volunteered at campus event", 3),
        earned(&bob, 150, "Won coding competition", 5),
        earned(&bob, 50, "Submitted project on time", 1),
        earned(&charlie, 75, "Participated in study group", 2),
    ];

    let rewards = vec![
        reward(
            "Free Coffee Voucher",
            50,
            20,
            "Redeem for a free coffee at the campus café",
        ),
        reward("Movie Ticket", 100, 10, "Free movie ticket at local cinema"),
        reward(
            "Book Store Discount",
            75,
            15,
            "20% discount voucher at campus bookstore",
        ),
    ];

    let users = vec![alice, bob, charlie, admin];
    LegacySnapshot {
        dw_users: users.clone(),
        fb_users: users,
        dw_rewards: rewards,
        dw_transactions: transactions,
        dw_point_requests: Vec::new(),
    }
}
