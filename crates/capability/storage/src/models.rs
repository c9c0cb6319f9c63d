//! 数据模型
//!
//! 定义所有存储相关的数据模型和更新结构：
//! - 智能设备模型：SmartDeviceRecord, SmartDeviceUpdate, DeviceFilter
//! - 状态历史模型：StateHistoryRecord
//! - 设备日志模型：DeviceLogRecord
//! - 传感器数据模型：SensorDataRecord
//! - 基础传感器模型：BaseDeviceRecord, BaseSensorDataRecord

use domain::{LogLevel, LogType};
use serde_json::Value;

/// 智能设备记录。
///
/// `state` 保存设备完整类型化状态的 JSON 快照（带 `type` 标签）。
#[derive(Debug, Clone)]
pub struct SmartDeviceRecord {
    pub device_id: String,
    pub device_type: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub state: Value,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// 智能设备元数据更新输入。
#[derive(Debug, Clone, Default)]
pub struct SmartDeviceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// 设备列表过滤条件。
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub device_type: Option<String>,
    pub location: Option<String>,
}

/// 状态历史记录（追加型）。
///
/// `reason` 为根据前一条历史推导出的人类可读变更原因，
/// `details` 为字段级差异。
#[derive(Debug, Clone)]
pub struct StateHistoryRecord {
    pub history_id: String,
    pub device_id: String,
    pub device_type: String,
    pub state: Value,
    pub reason: Option<String>,
    pub details: Option<Value>,
    pub timestamp_ms: i64,
}

/// 设备日志记录（追加型）。
#[derive(Debug, Clone)]
pub struct DeviceLogRecord {
    pub log_id: String,
    pub device_id: String,
    pub device_type: String,
    pub level: LogLevel,
    pub log_type: LogType,
    pub message: String,
    pub details: Option<Value>,
    pub timestamp_ms: i64,
}

/// 智能设备传感器数据记录（追加型）。
///
/// 类型特定字段以稀疏 JSON 对象保存在 `fields`；
/// 运行时长与能效为派生指标，单独建列以便查询最近一条带运行时长的记录。
#[derive(Debug, Clone)]
pub struct SensorDataRecord {
    pub record_id: String,
    pub device_id: String,
    pub device_type: String,
    pub fields: Value,
    pub power_consumption: Option<f64>,
    pub runtime_minutes: Option<f64>,
    pub energy_efficiency: Option<f64>,
    pub timestamp_ms: i64,
}

/// 基础传感器设备记录。
///
/// 阈值语义：value ≤ lower → status "on"；value ≥ upper → status "off"。
#[derive(Debug, Clone)]
pub struct BaseDeviceRecord {
    pub device_id: String,
    pub sensor_type: String,
    pub location: Option<Value>,
    pub lower_threshold: f64,
    pub upper_threshold: f64,
    pub status: String,
    pub updated_at_ms: i64,
}

/// 基础传感器数据记录（追加型）。
#[derive(Debug, Clone)]
pub struct BaseSensorDataRecord {
    pub record_id: String,
    pub device_id: String,
    pub value: f64,
    pub status: String,
    pub timestamp_ms: i64,
}
