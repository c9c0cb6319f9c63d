//! 健康检查与进程指标 handlers。

use crate::response::ok;
use axum::response::Response;
use serde_json::json;

pub async fn health() -> Response {
    ok(json!({ "ok": true }))
}

pub async fn metrics_snapshot() -> Response {
    let snapshot = home_telemetry::metrics().snapshot();
    ok(json!({
        "messages_received": snapshot.messages_received,
        "states_updated": snapshot.states_updated,
        "states_rejected": snapshot.states_rejected,
        "devices_autocreated": snapshot.devices_autocreated,
        "commands_issued": snapshot.commands_issued,
        "command_dispatch_success": snapshot.command_dispatch_success,
        "command_dispatch_failure": snapshot.command_dispatch_failure,
        "audit_write_failures": snapshot.audit_write_failures,
        "base_sensor_messages": snapshot.base_sensor_messages,
        "anomalies_detected": snapshot.anomalies_detected,
    }))
}
