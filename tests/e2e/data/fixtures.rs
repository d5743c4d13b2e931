//! 测试数据 Fixtures
//!
//! 演示数据中的账号与奖品，以及新建奖品的参数模板。

use points_wallet::models::NewReward;

/// 演示账号
pub struct DemoAccount {
    pub email: &'static str,
    pub password: &'static str,
    pub display_id: &'static str,
    pub points: i64,
}

pub const ALICE: DemoAccount = DemoAccount {
    email: "alice@student.com",
    password: "student123",
    display_id: "STU001",
    points: 150,
};

pub const BOB: DemoAccount = DemoAccount {
    email: "bob@student.com",
    password: "student123",
    display_id: "STU002",
    points: 200,
};

pub const CHARLIE: DemoAccount = DemoAccount {
    email: "charlie@student.com",
    password: "student123",
    display_id: "STU003",
    points: 75,
};

pub const ADMIN: DemoAccount = DemoAccount {
    email: "admin@gmail.com",
    password: "admin123",
    display_id: "ADMIN001",
    points: 0,
};

pub const DEMO_ADMIN_ID: &str = "admin-001";

/// 演示奖品标题
pub struct DemoRewards;

impl DemoRewards {
    pub const COFFEE: &'static str = "Free Coffee Voucher";
    pub const MOVIE: &'static str = "Movie Ticket";
    pub const BOOKSTORE: &'static str = "Book Store Discount";
}

/// 新建奖品模板
pub struct TestRewards;

impl TestRewards {
    /// 只剩一件的奖品，用于并发抢兑
    pub fn last_item(cost: i64) -> NewReward {
        NewReward {
            title: format!("Limited Hoodie {}", uuid::Uuid::new_v4().simple()),
            cost,
            quantity: 1,
            description: "Campus hoodie, one left".to_string(),
        }
    }

    pub fn stocked(title: &str, cost: i64, quantity: i64) -> NewReward {
        NewReward {
            title: title.to_string(),
            cost,
            quantity,
            description: String::new(),
        }
    }
}
