//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 存储后端类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite 文件存储（持久化）
    #[default]
    Sqlite,
    /// 进程内存储，进程退出即丢失
    Memory,
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// SQLite 忙锁等待时间
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            url: "sqlite://points-wallet.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            busy_timeout_ms: 5_000,
        }
    }
}

/// 账本配置
///
/// 乐观并发冲突时的重试参数，以及可选的模拟延迟
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// 版本冲突最大重试次数（不含首次执行）
    pub max_conflict_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// 模拟存储延迟下限（毫秒），与上限同时配置时生效
    pub simulated_latency_min_ms: Option<u64>,
    /// 模拟存储延迟上限（毫秒）
    pub simulated_latency_max_ms: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 5,
            retry_initial_delay_ms: 5,
            retry_max_delay_ms: 200,
            simulated_latency_min_ms: None,
            simulated_latency_max_ms: None,
        }
    }
}

impl LedgerConfig {
    /// 返回模拟延迟区间，未配置完整时为 None
    pub fn simulated_latency(&self) -> Option<(u64, u64)> {
        match (self.simulated_latency_min_ms, self.simulated_latency_max_ms) {
            (Some(min), Some(max)) if max >= min => Some((min, max)),
            _ => None,
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 会话 Token 签名密钥
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// 会话有效期（秒）
    pub session_ttl_secs: i64,
    /// bcrypt 计算成本，测试环境可调低
    pub bcrypt_cost: u32,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "points-wallet-secret-change-in-production".to_string(),
            jwt_issuer: "points-wallet".to_string(),
            session_ttl_secs: 86_400, // 24 小时
            bcrypt_cost: 12,
            min_password_length: 6,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 服务名称，用于标识日志和指标的来源
    pub service_name: String,
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "points-wallet".to_string(),
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ObservabilityConfig {
    /// 注入服务名
    pub fn with_service_name(mut self, name: &str) -> Self {
        self.service_name = name.to_string();
        self
    }

    /// 是否输出 JSON 格式日志
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub database: DatabaseConfig,
    pub ledger: LedgerConfig,
    pub auth: AuthConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（POINTS_ 前缀，双下划线分隔层级，如 POINTS_DATABASE__URL -> database.url）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("POINTS_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("POINTS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
