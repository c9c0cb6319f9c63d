//! 设备日志级别与类别。

use serde::{Deserialize, Serialize};

/// 日志级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// 从存储文本还原日志级别。
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INFO" => Some(LogLevel::Info),
            "WARNING" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            "DEBUG" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

/// 日志类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    StateChange,
    Command,
    Error,
    Maintenance,
    SensorData,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::StateChange => "STATE_CHANGE",
            LogType::Command => "COMMAND",
            LogType::Error => "ERROR",
            LogType::Maintenance => "MAINTENANCE",
            LogType::SensorData => "SENSOR_DATA",
        }
    }

    /// 从存储文本还原日志类别。
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STATE_CHANGE" => Some(LogType::StateChange),
            "COMMAND" => Some(LogType::Command),
            "ERROR" => Some(LogType::Error),
            "MAINTENANCE" => Some(LogType::Maintenance),
            "SENSOR_DATA" => Some(LogType::SensorData),
            _ => None,
        }
    }
}
