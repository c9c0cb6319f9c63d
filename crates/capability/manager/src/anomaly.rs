//! 状态异常检测。
//!
//! 对通过校验的新状态做阈值检查，命中即产生 WARNING 级
//! STATE_CHANGE 日志条目（由编排层落库）。

use crate::audit::POWER_ALERT_THRESHOLD_WATTS;
use domain::DeviceState;
use serde_json::{Value, json};

/// 温差告警阈值 (°C)。
pub const TEMP_DEVIATION_THRESHOLD: f64 = 5.0;

/// 单条异常命中：告警消息与结构化明细。
#[derive(Debug, Clone)]
pub struct Anomaly {
    pub message: String,
    pub details: Value,
}

/// 检查状态异常。
///
/// - 温控器：当前/目标温差绝对值超过 [`TEMP_DEVIATION_THRESHOLD`]
/// - 任何携带功率的类型：功率消耗超过 [`POWER_ALERT_THRESHOLD_WATTS`]
pub fn detect_anomalies(state: &DeviceState) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if let DeviceState::Thermostat(thermostat) = state {
        let diff = thermostat.current_temp - thermostat.target_temp;
        if diff.abs() > TEMP_DEVIATION_THRESHOLD {
            anomalies.push(Anomaly {
                message: format!(
                    "temperature deviation too large: current={}°C, target={}°C",
                    thermostat.current_temp, thermostat.target_temp
                ),
                details: json!({ "temp_diff": diff }),
            });
        }
    }

    if let Some(power) = state.power_consumption() {
        if power > POWER_ALERT_THRESHOLD_WATTS {
            anomalies.push(Anomaly {
                message: format!("power consumption too high: {power}W"),
                details: json!({ "power_consumption": power }),
            });
        }
    }

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{BaseDeviceState, PlugState, ThermostatState};

    fn base() -> BaseDeviceState {
        BaseDeviceState {
            online: true,
            last_update: 1_700_000_000_000,
            error_state: None,
        }
    }

    fn thermostat(current: f64, target: f64, power: f64) -> DeviceState {
        DeviceState::Thermostat(ThermostatState {
            base: base(),
            current_temp: current,
            target_temp: target,
            humidity: 50.0,
            mode: "auto".to_string(),
            fan_speed: "auto".to_string(),
            power_consumption: power,
        })
    }

    #[test]
    fn temp_deviation_beyond_threshold_is_flagged() {
        let anomalies = detect_anomalies(&thermostat(28.0, 22.0, 500.0));
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].message.contains("temperature deviation"));
        assert_eq!(anomalies[0].details["temp_diff"], 6.0);
    }

    #[test]
    fn deviation_at_threshold_is_not_flagged() {
        assert!(detect_anomalies(&thermostat(27.0, 22.0, 500.0)).is_empty());
        assert!(detect_anomalies(&thermostat(24.0, 22.0, 500.0)).is_empty());
    }

    #[test]
    fn high_power_is_flagged_for_any_powered_type() {
        let plug = DeviceState::Plug(PlugState {
            base: base(),
            on: true,
            power_consumption: 2500.0,
            voltage: 220.0,
            current: 11.4,
            power_factor: 0.95,
            timer: 0.0,
        });
        let anomalies = detect_anomalies(&plug);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].message.contains("power consumption too high"));
    }

    #[test]
    fn deviation_and_power_can_both_fire() {
        let anomalies = detect_anomalies(&thermostat(29.0, 18.0, 2200.0));
        assert_eq!(anomalies.len(), 2);
    }
}
