//! 审计派生：状态历史的变更原因与字段差异、传感器数据
//! 字段抽取、温控器运行时长与能效派生。
//!
//! 全部为纯函数，存储读写由编排层负责。

use domain::{DeviceType, ThermostatState};
use home_storage::SensorDataRecord;
use serde_json::{Map, Value, json};

/// 温控器功率告警阈值 (W)。
pub const POWER_ALERT_THRESHOLD_WATTS: f64 = 2000.0;

/// 从前一条历史与新状态快照推导变更原因与字段级差异。
///
/// 原因优先级：错误状态 > 设备离线 > 具名字段变化
/// （温度/模式/风速，后者覆盖前者）> 默认 "state update"。
pub fn history_reason_and_details(
    prev: Option<&Value>,
    next: &Value,
) -> (String, Option<Value>) {
    let mut details = Map::new();

    if let (Some(prev_obj), Some(next_obj)) = (
        prev.and_then(Value::as_object),
        next.as_object(),
    ) {
        for (key, next_value) in next_obj {
            if matches!(key.as_str(), "type" | "last_update") {
                continue;
            }
            let Some(prev_value) = prev_obj.get(key) else {
                continue;
            };
            if prev_value != next_value {
                details.insert(
                    format!("{key}_change"),
                    change_entry(prev_value, next_value),
                );
            }
        }
    }

    let reason = if let Some(message) = next.get("error_state").and_then(Value::as_str) {
        format!("error state: {message}")
    } else if next.get("online") == Some(&Value::Bool(false)) {
        "device offline".to_string()
    } else {
        let mut reason = "state update".to_string();
        for (key, named) in [
            ("current_temp_change", "temperature change"),
            ("mode_change", "mode change"),
            ("fan_speed_change", "fan speed change"),
        ] {
            if details.contains_key(key) {
                reason = named.to_string();
            }
        }
        reason
    };

    let details = if details.is_empty() {
        None
    } else {
        Some(Value::Object(details))
    };
    (reason, details)
}

fn change_entry(from: &Value, to: &Value) -> Value {
    if let (Some(a), Some(b)) = (from.as_f64(), to.as_f64()) {
        json!({ "from": from, "to": to, "diff": b - a })
    } else {
        json!({ "from": from, "to": to })
    }
}

/// 从原始载荷按设备类型抽取传感器字段（稀疏，仅收载荷中出现的键）。
pub fn sensor_fields(device_type: DeviceType, raw: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    copy_field(&mut fields, raw, "power_consumption", "power_consumption");
    copy_field(&mut fields, raw, "battery_level", "battery_level");

    match device_type {
        DeviceType::Light => {
            copy_field(&mut fields, raw, "brightness", "brightness");
            copy_field(&mut fields, raw, "color_temp", "color_temp");
        }
        DeviceType::Thermostat => {
            copy_field(&mut fields, raw, "current_temp", "current_temp");
            copy_field(&mut fields, raw, "target_temp", "target_temp");
            copy_field(&mut fields, raw, "humidity", "humidity");
            copy_field(&mut fields, raw, "mode", "mode");
            copy_field(&mut fields, raw, "fan_speed", "fan_speed");
        }
        DeviceType::DoorLock => {
            copy_field(&mut fields, raw, "locked", "locked");
            copy_field(&mut fields, raw, "last_lock_time", "last_lock_time");
            copy_field(&mut fields, raw, "last_unlock_time", "last_unlock_time");
        }
        DeviceType::Blind => {
            copy_field(&mut fields, raw, "position", "position");
            copy_field(&mut fields, raw, "tilt", "tilt");
            copy_field(&mut fields, raw, "moving", "moving");
            copy_field(&mut fields, raw, "last_move_time", "last_move_time");
        }
        DeviceType::AirConditioner => {
            copy_field(&mut fields, raw, "on", "ac_on");
            copy_field(&mut fields, raw, "temp", "ac_temp");
            copy_field(&mut fields, raw, "mode", "ac_mode");
            copy_field(&mut fields, raw, "fan_speed", "ac_fan_speed");
            copy_field(&mut fields, raw, "swing", "ac_swing");
        }
        DeviceType::SmokeDetector => {
            copy_field(&mut fields, raw, "alarm", "alarm");
            copy_field(&mut fields, raw, "smoke_level", "smoke_level");
            copy_field(&mut fields, raw, "last_test_time", "last_test_time");
        }
        DeviceType::Fan => {
            copy_field(&mut fields, raw, "on", "fan_on");
            copy_field(&mut fields, raw, "speed", "speed");
            copy_field(&mut fields, raw, "oscillate", "oscillate");
            copy_field(&mut fields, raw, "timer", "timer");
        }
        DeviceType::Plug => {
            copy_field(&mut fields, raw, "on", "plug_on");
            copy_field(&mut fields, raw, "voltage", "voltage");
            copy_field(&mut fields, raw, "current", "current");
            copy_field(&mut fields, raw, "power_factor", "power_factor");
            copy_field(&mut fields, raw, "timer", "plug_timer");
        }
    }
    fields
}

fn copy_field(fields: &mut Map<String, Value>, raw: &Value, src: &str, dst: &str) {
    if let Some(value) = raw.get(src) {
        fields.insert(dst.to_string(), value.clone());
    }
}

/// 累计运行时长（分钟）：上一条带时长的记录加上自该记录以来的整分钟数。
/// 没有历史记录时从 0 开始。
pub fn runtime_minutes(prev: Option<&SensorDataRecord>, now_ms: i64) -> f64 {
    match prev.and_then(|record| record.runtime_minutes.map(|minutes| (minutes, record.timestamp_ms))) {
        Some((minutes, recorded_at_ms)) => {
            let elapsed_ms = (now_ms - recorded_at_ms).max(0);
            minutes + (elapsed_ms / 60_000) as f64
        }
        None => 0.0,
    }
}

/// 能效比：温差绝对值 / 功率消耗；功率或温差为 0 时记 0。
pub fn energy_efficiency(state: &ThermostatState) -> f64 {
    if state.power_consumption == 0.0 {
        return 0.0;
    }
    let temp_diff = (state.current_temp - state.target_temp).abs();
    if temp_diff == 0.0 {
        return 0.0;
    }
    temp_diff / state.power_consumption
}
