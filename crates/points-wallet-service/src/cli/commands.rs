//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。
//! 除 `seed`、`reset`、`import`、`register`、`login` 外，其余子命令以当前会话用户身份执行。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::Role;

/// 学生积分钱包命令行工具
#[derive(Parser, Debug)]
#[command(name = "points-wallet")]
#[command(version, about = "学生积分钱包")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别，覆盖配置文件 (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// 命令结束后输出 Prometheus 格式的指标快照
    #[arg(long)]
    pub dump_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 写入演示数据（仅首次生效）
    Seed,

    /// 清空所有数据并重新写入演示数据
    Reset,

    /// 从旧版 JSON 快照导入数据
    Import {
        /// 快照文件路径
        file: PathBuf,
    },

    /// 注册新账号并登录
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        name: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// 账号角色 (student, admin)
        #[arg(short, long, default_value = "student")]
        role: Role,
    },

    /// 登录
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// 退出登录
    Logout,

    /// 显示当前登录用户
    Whoami,

    /// 列出奖品
    Rewards,

    /// 新增奖品（管理员）
    RewardAdd {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        cost: i64,

        #[arg(short, long)]
        quantity: i64,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// 修改奖品（管理员）
    RewardUpdate {
        /// 奖品 ID
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        cost: Option<i64>,

        #[arg(short, long)]
        quantity: Option<i64>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// 删除奖品（管理员）
    RewardDelete {
        /// 奖品 ID
        id: String,
    },

    /// 兑换奖品
    Redeem {
        /// 奖品 ID
        reward_id: String,
    },

    /// 提交积分申请
    Request {
        #[arg(short, long)]
        amount: i64,

        #[arg(short, long)]
        reason: String,
    },

    /// 列出积分申请
    ///
    /// 学生只能看到自己的申请，管理员看到全部
    Requests {
        /// 只显示待审核申请
        #[arg(long)]
        pending: bool,
    },

    /// 通过积分申请（管理员）
    Approve {
        /// 申请 ID
        request_id: String,
    },

    /// 拒绝积分申请（管理员）
    Reject {
        /// 申请 ID
        request_id: String,
    },

    /// 调整用户积分（管理员）
    Adjust {
        /// 用户 ID
        #[arg(short, long)]
        user: String,

        /// 调整值，可为负
        #[arg(short, long, allow_negative_numbers = true)]
        delta: i64,

        #[arg(short, long)]
        reason: String,
    },

    /// 查看积分流水
    History {
        /// 用户 ID，仅管理员可查看他人流水
        #[arg(short, long)]
        user: Option<String>,
    },

    /// 列出用户（管理员）
    Users {
        #[arg(short, long)]
        role: Option<Role>,
    },

    /// 核对缓存余额与流水合计（管理员）
    Audit,
}
