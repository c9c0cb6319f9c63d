pub mod command;
pub mod log;
pub mod state;

pub use command::DeviceCommand;
pub use log::{LogLevel, LogType};
pub use state::{
    AirConditionerState, BaseDeviceState, BlindState, DeviceState, DoorLockState, FanState,
    LightState, PlugState, SmokeDetectorState, ThermostatState,
};

use serde::{Deserialize, Serialize};

/// 设备类型：8 类智能家居设备的封闭枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Light,
    Thermostat,
    DoorLock,
    Blind,
    AirConditioner,
    SmokeDetector,
    Fan,
    Plug,
}

/// 未知设备类型错误。
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown device type: {0}")]
pub struct UnknownDeviceType(pub String);

impl DeviceType {
    pub const ALL: [DeviceType; 8] = [
        DeviceType::Light,
        DeviceType::Thermostat,
        DeviceType::DoorLock,
        DeviceType::Blind,
        DeviceType::AirConditioner,
        DeviceType::SmokeDetector,
        DeviceType::Fan,
        DeviceType::Plug,
    ];

    /// 解析线上类型字符串（大小写不敏感，含同义词表）。
    ///
    /// 同义词：`ac` 与 `airconditioner`、`smoke_detector` 与 `smokedetector`；
    /// 规范名（`DOOR_LOCK`、`AIR_CONDITIONER` 等）也可解析。
    pub fn resolve(wire_type: &str) -> Result<Self, UnknownDeviceType> {
        match wire_type.to_ascii_lowercase().as_str() {
            "light" => Ok(DeviceType::Light),
            "thermostat" => Ok(DeviceType::Thermostat),
            "doorlock" | "door_lock" => Ok(DeviceType::DoorLock),
            "blind" => Ok(DeviceType::Blind),
            "ac" | "airconditioner" | "air_conditioner" => Ok(DeviceType::AirConditioner),
            "smoke_detector" | "smokedetector" => Ok(DeviceType::SmokeDetector),
            "fan" => Ok(DeviceType::Fan),
            "plug" => Ok(DeviceType::Plug),
            _ => Err(UnknownDeviceType(wire_type.to_string())),
        }
    }

    /// 规范名称（与持久化及状态联合体的 tag 一致）。
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Light => "LIGHT",
            DeviceType::Thermostat => "THERMOSTAT",
            DeviceType::DoorLock => "DOOR_LOCK",
            DeviceType::Blind => "BLIND",
            DeviceType::AirConditioner => "AIR_CONDITIONER",
            DeviceType::SmokeDetector => "SMOKE_DETECTOR",
            DeviceType::Fan => "FAN",
            DeviceType::Plug => "PLUG",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 字段级校验错误（状态或命令）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// 将校验错误列表拼为一条可读消息。
pub fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 当前 Unix 毫秒时间戳。
pub fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
