//! 温控器画像。

use crate::coerce::{base_from_raw, clamp_f64, num_field, str_field};
use crate::{
    DeviceProfile, ProfileError, check_num_param_range, check_str_param_one_of,
    check_supported_command, require_num_param, require_str_param, validate_base,
    variant_mismatch,
};
use domain::{DeviceCommand, DeviceState, DeviceType, ThermostatState, ValidationError};
use serde_json::{Value, json};

pub(crate) const MODES: [&str; 3] = ["auto", "heat", "cool"];
pub(crate) const FAN_SPEEDS: [&str; 4] = ["auto", "low", "medium", "high"];

const SUPPORTED_COMMANDS: [&str; 3] = ["set_temp", "set_mode", "set_fan_speed"];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::Thermostat,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::Thermostat(ThermostatState {
        base: base_from_raw(raw, now_ms),
        current_temp: clamp_f64(num_field(raw, "current_temp", 22.0), 16.0, 30.0).value,
        target_temp: clamp_f64(num_field(raw, "target_temp", 24.0), 16.0, 30.0).value,
        humidity: clamp_f64(num_field(raw, "humidity", 50.0), 0.0, 100.0).value,
        mode: str_field(raw, "mode", "auto"),
        fan_speed: str_field(raw, "fan_speed", "auto"),
        power_consumption: num_field(raw, "power_consumption", 0.0).max(0.0),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::Thermostat(state) = state else {
        return variant_mismatch(DeviceType::Thermostat);
    };
    let mut errors = validate_base(&state.base);
    if !(16.0..=30.0).contains(&state.current_temp) {
        errors.push(ValidationError::new(
            "current_temp",
            "current_temp must be a number between 16 and 30",
        ));
    }
    if !(16.0..=30.0).contains(&state.target_temp) {
        errors.push(ValidationError::new(
            "target_temp",
            "target_temp must be a number between 16 and 30",
        ));
    }
    if !(0.0..=100.0).contains(&state.humidity) {
        errors.push(ValidationError::new(
            "humidity",
            "humidity must be a number between 0 and 100",
        ));
    }
    if !MODES.contains(&state.mode.as_str()) {
        errors.push(ValidationError::new(
            "mode",
            format!("mode must be one of: {}", MODES.join(", ")),
        ));
    }
    if !FAN_SPEEDS.contains(&state.fan_speed.as_str()) {
        errors.push(ValidationError::new(
            "fan_speed",
            format!("fan_speed must be one of: {}", FAN_SPEEDS.join(", ")),
        ));
    }
    if state.power_consumption < 0.0 {
        errors.push(ValidationError::new(
            "power_consumption",
            "power_consumption must be a non-negative number",
        ));
    }
    errors
}

fn validate_command(command: &DeviceCommand) -> Vec<ValidationError> {
    if let Some(error) = check_supported_command(command, &SUPPORTED_COMMANDS) {
        return vec![error];
    }
    let mut errors = Vec::new();
    match command.command.as_str() {
        "set_temp" => errors.extend(check_num_param_range(command, "temp", 16.0, 30.0)),
        "set_mode" => errors.extend(check_str_param_one_of(command, "mode", &MODES)),
        "set_fan_speed" => {
            errors.extend(check_str_param_one_of(command, "fan_speed", &FAN_SPEEDS));
        }
        _ => {}
    }
    errors
}

fn process_command(command: &DeviceCommand, _now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "set_temp" => {
            let temp = require_num_param(command, "temp", 16.0, 30.0)?;
            Ok(json!({ "target_temp": temp }))
        }
        "set_mode" => {
            let mode = require_str_param(command, "mode", &MODES)?;
            Ok(json!({ "mode": mode }))
        }
        "set_fan_speed" => {
            let fan_speed = require_str_param(command, "fan_speed", &FAN_SPEEDS)?;
            Ok(json!({ "fan_speed": fan_speed }))
        }
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}
