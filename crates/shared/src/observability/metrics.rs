//! 业务指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集。
//! recorder 安装在进程内，不启动 HTTP 端点；快照由调用方按需渲染。

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::ObservabilityConfig;

/// Metrics 资源句柄
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    /// 渲染 Prometheus 文本格式快照
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// 安装 Prometheus recorder 并注册指标描述
pub fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_common_metrics(&config.service_name);
    Ok(MetricsHandle { handle })
}

/// 注册通用指标（预定义的业务指标）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "points_transactions_total",
        "Total number of ledger transactions recorded"
    );
    metrics::describe_counter!("redemptions_total", "Total number of reward redemptions");
    metrics::describe_histogram!(
        "redemption_duration_seconds",
        "Reward redemption duration in seconds"
    );
    metrics::describe_counter!(
        "point_requests_total",
        "Total number of point request state changes"
    );
    metrics::describe_counter!(
        "conflict_retries_total",
        "Optimistic concurrency retries by operation"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录账本流水
#[inline]
pub fn record_transaction(kind: &str) {
    metrics::counter!("points_transactions_total", "type" => kind.to_string()).increment(1);
}

/// 记录兑换结果
#[inline]
pub fn record_redemption(status: &str, duration_secs: f64) {
    metrics::counter!("redemptions_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("redemption_duration_seconds", "status" => status.to_string())
        .record(duration_secs);
}

/// 记录积分申请状态变更
#[inline]
pub fn record_point_request(status: &str) {
    metrics::counter!("point_requests_total", "status" => status.to_string()).increment(1);
}
