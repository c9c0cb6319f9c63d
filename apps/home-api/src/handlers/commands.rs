//! 命令下发 handler。
//!
//! POST /devices/{device_id}/commands - 校验并发布设备命令。
//! 发布为 fire-and-forget，响应返回实际发布的线上载荷。

use crate::AppState;
use crate::response::{manager_error, ok};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::DeviceCommand;
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Deserialize)]
pub struct CommandRequest {
    command: String,
    #[serde(default)]
    params: Map<String, Value>,
}

pub async fn send_command(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Response {
    let command = DeviceCommand {
        command: req.command,
        params: req.params,
        timestamp: None,
    };
    match state.manager.send_command(&device_id, command).await {
        Ok(payload) => ok(json!({ "dispatched": true, "payload": payload })),
        Err(err) => manager_error(err),
    }
}
