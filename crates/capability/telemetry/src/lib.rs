//! 追踪与进程级指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub states_updated: u64,
    pub states_rejected: u64,
    pub devices_autocreated: u64,
    pub commands_issued: u64,
    pub command_dispatch_success: u64,
    pub command_dispatch_failure: u64,
    pub audit_write_failures: u64,
    pub base_sensor_messages: u64,
    pub anomalies_detected: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    messages_received: AtomicU64,
    states_updated: AtomicU64,
    states_rejected: AtomicU64,
    devices_autocreated: AtomicU64,
    commands_issued: AtomicU64,
    command_dispatch_success: AtomicU64,
    command_dispatch_failure: AtomicU64,
    audit_write_failures: AtomicU64,
    base_sensor_messages: AtomicU64,
    anomalies_detected: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            states_updated: AtomicU64::new(0),
            states_rejected: AtomicU64::new(0),
            devices_autocreated: AtomicU64::new(0),
            commands_issued: AtomicU64::new(0),
            command_dispatch_success: AtomicU64::new(0),
            command_dispatch_failure: AtomicU64::new(0),
            audit_write_failures: AtomicU64::new(0),
            base_sensor_messages: AtomicU64::new(0),
            anomalies_detected: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            states_updated: self.states_updated.load(Ordering::Relaxed),
            states_rejected: self.states_rejected.load(Ordering::Relaxed),
            devices_autocreated: self.devices_autocreated.load(Ordering::Relaxed),
            commands_issued: self.commands_issued.load(Ordering::Relaxed),
            command_dispatch_success: self.command_dispatch_success.load(Ordering::Relaxed),
            command_dispatch_failure: self.command_dispatch_failure.load(Ordering::Relaxed),
            audit_write_failures: self.audit_write_failures.load(Ordering::Relaxed),
            base_sensor_messages: self.base_sensor_messages.load(Ordering::Relaxed),
            anomalies_detected: self.anomalies_detected.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录入站消息接收次数。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录设备状态更新成功次数。
pub fn record_state_updated() {
    metrics().states_updated.fetch_add(1, Ordering::Relaxed);
}

/// 记录状态校验拒绝次数（进入错误状态）。
pub fn record_state_rejected() {
    metrics().states_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录设备自动建档次数。
pub fn record_device_autocreated() {
    metrics().devices_autocreated.fetch_add(1, Ordering::Relaxed);
}

/// 记录命令下发请求次数。
pub fn record_command_issued() {
    metrics().commands_issued.fetch_add(1, Ordering::Relaxed);
}

/// 记录命令下发成功次数（MQTT 发布成功）。
pub fn record_command_dispatch_success() {
    metrics()
        .command_dispatch_success
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录命令下发失败次数（MQTT 发布失败）。
pub fn record_command_dispatch_failure() {
    metrics()
        .command_dispatch_failure
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录审计写入失败次数（历史/日志/传感器任一）。
pub fn record_audit_write_failure() {
    metrics().audit_write_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录基础传感器消息次数。
pub fn record_base_sensor_message() {
    metrics().base_sensor_messages.fetch_add(1, Ordering::Relaxed);
}

/// 记录异常检测命中次数。
pub fn record_anomaly_detected() {
    metrics().anomalies_detected.fetch_add(1, Ordering::Relaxed);
}
