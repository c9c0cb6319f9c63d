//! 设备 CRUD handlers。
//!
//! - GET /devices - 按类型/位置过滤列出设备
//! - POST /devices - 手工建档
//! - GET /devices/{device_id} - 设备详情（含状态快照）
//! - DELETE /devices/{device_id} - 删除设备

use crate::AppState;
use crate::response::{bad_request, created, manager_error, ok};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use domain::DeviceType;
use home_manager::NewDevice;
use home_storage::{DeviceFilter, SmartDeviceRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
pub struct DeviceQuery {
    #[serde(rename = "type")]
    device_type: Option<String>,
    location: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    device_id: String,
    #[serde(rename = "type")]
    device_type: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Serialize)]
pub struct DeviceDto {
    pub device_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub state: Value,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

pub fn device_to_dto(record: SmartDeviceRecord) -> DeviceDto {
    DeviceDto {
        device_id: record.device_id,
        device_type: record.device_type,
        name: record.name,
        description: record.description,
        location: record.location,
        state: record.state,
        created_at_ms: record.created_at_ms,
        updated_at_ms: record.updated_at_ms,
    }
}

pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> Response {
    // 过滤类型统一到规范名，未知类型直接报错而不是静默空结果。
    let device_type = match query.device_type.as_deref() {
        Some(raw) => match DeviceType::resolve(raw) {
            Ok(device_type) => Some(device_type.as_str().to_string()),
            Err(err) => return bad_request(err.to_string()),
        },
        None => None,
    };
    let filter = DeviceFilter {
        device_type,
        location: query.location,
    };
    match state.manager.list_devices(&filter).await {
        Ok(records) => ok(records.into_iter().map(device_to_dto).collect::<Vec<_>>()),
        Err(err) => manager_error(err),
    }
}

pub async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<CreateDeviceRequest>,
) -> Response {
    let device_type = match DeviceType::resolve(&req.device_type) {
        Ok(device_type) => device_type,
        Err(err) => return bad_request(err.to_string()),
    };
    if req.device_id.is_empty() || req.name.is_empty() {
        return bad_request("device_id and name must be non-empty");
    }
    let input = NewDevice {
        device_id: req.device_id,
        device_type,
        name: req.name,
        description: req.description,
        location: req.location,
    };
    match state.manager.create_device(input).await {
        Ok(record) => created(device_to_dto(record)),
        Err(err) => manager_error(err),
    }
}

pub async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Response {
    match state.manager.get_device(&device_id).await {
        Ok(record) => ok(device_to_dto(record)),
        Err(err) => manager_error(err),
    }
}

pub async fn delete_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Response {
    match state.manager.delete_device(&device_id).await {
        Ok(()) => ok(serde_json::json!({ "deleted": true })),
        Err(err) => manager_error(err),
    }
}
