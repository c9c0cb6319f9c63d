//! 审计查询 handlers。
//!
//! - GET /devices/{device_id}/history?limit= - 状态历史（时间倒序）
//! - GET /devices/{device_id}/logs?limit= - 设备日志（时间倒序）

use crate::AppState;
use crate::response::{manager_error, ok};
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use home_storage::{DeviceLogRecord, StateHistoryRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

impl LimitQuery {
    fn effective(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Serialize)]
pub struct HistoryDto {
    pub history_id: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub state: Value,
    pub reason: Option<String>,
    pub details: Option<Value>,
    pub timestamp_ms: i64,
}

#[derive(Serialize)]
pub struct LogDto {
    pub log_id: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub level: String,
    pub log_type: String,
    pub message: String,
    pub details: Option<Value>,
    pub timestamp_ms: i64,
}

fn history_to_dto(record: StateHistoryRecord) -> HistoryDto {
    HistoryDto {
        history_id: record.history_id,
        device_id: record.device_id,
        device_type: record.device_type,
        state: record.state,
        reason: record.reason,
        details: record.details,
        timestamp_ms: record.timestamp_ms,
    }
}

fn log_to_dto(record: DeviceLogRecord) -> LogDto {
    LogDto {
        log_id: record.log_id,
        device_id: record.device_id,
        device_type: record.device_type,
        level: record.level.as_str().to_string(),
        log_type: record.log_type.as_str().to_string(),
        message: record.message,
        details: record.details,
        timestamp_ms: record.timestamp_ms,
    }
}

pub async fn list_history(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    match state.manager.list_history(&device_id, query.effective()).await {
        Ok(records) => ok(records.into_iter().map(history_to_dto).collect::<Vec<_>>()),
        Err(err) => manager_error(err),
    }
}

pub async fn list_logs(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    match state.manager.list_logs(&device_id, query.effective()).await {
        Ok(records) => ok(records.into_iter().map(log_to_dto).collect::<Vec<_>>()),
        Err(err) => manager_error(err),
    }
}
