//! 设备命令模型。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 设备命令：命令名加可选参数表。
///
/// 临时对象，除审计日志外不持久化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub command: String,
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl DeviceCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: serde_json::Map::new(),
            timestamp: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 读取参数原始值。
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_deserializes_without_params() {
        let command: DeviceCommand =
            serde_json::from_str(r#"{"command":"turn_on"}"#).expect("parse");
        assert_eq!(command.command, "turn_on");
        assert!(command.params.is_empty());
        assert!(command.timestamp.is_none());
    }

    #[test]
    fn command_builder_sets_params() {
        let command = DeviceCommand::new("set_brightness").with_param("brightness", 80);
        assert_eq!(command.param("brightness"), Some(&Value::from(80)));
    }
}
