//! 空调画像。

use crate::coerce::{base_from_raw, bool_field, clamp_f64, num_field, str_field};
use crate::{
    DeviceProfile, ProfileError, bool_param, check_num_param_range, check_str_param_one_of,
    check_supported_command, require_num_param, require_str_param, validate_base,
    variant_mismatch,
};
use domain::{AirConditionerState, DeviceCommand, DeviceState, DeviceType, ValidationError};
use serde_json::{Value, json};

pub(crate) const MODES: [&str; 4] = ["cool", "heat", "dry", "fan"];
pub(crate) const FAN_SPEEDS: [&str; 4] = ["auto", "low", "medium", "high"];

const SUPPORTED_COMMANDS: [&str; 6] = [
    "turn_on",
    "turn_off",
    "set_temp",
    "set_mode",
    "set_fan_speed",
    "set_swing",
];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::AirConditioner,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::AirConditioner(AirConditionerState {
        base: base_from_raw(raw, now_ms),
        on: bool_field(raw, "on", false),
        temp: clamp_f64(num_field(raw, "temp", 26.0), 16.0, 30.0).value,
        mode: str_field(raw, "mode", "cool"),
        fan_speed: str_field(raw, "fan_speed", "auto"),
        swing: bool_field(raw, "swing", false),
        power_consumption: num_field(raw, "power_consumption", 0.0).max(0.0),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::AirConditioner(state) = state else {
        return variant_mismatch(DeviceType::AirConditioner);
    };
    let mut errors = validate_base(&state.base);
    if !(16.0..=30.0).contains(&state.temp) {
        errors.push(ValidationError::new(
            "temp",
            "temp must be a number between 16 and 30",
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
        "turn_on" => Ok(json!({ "on": true })),
        "turn_off" => Ok(json!({ "on": false })),
        "set_temp" => {
            let temp = require_num_param(command, "temp", 16.0, 30.0)?;
            Ok(json!({ "temp": temp }))
        }
        "set_mode" => {
            let mode = require_str_param(command, "mode", &MODES)?;
            Ok(json!({ "mode": mode }))
        }
        "set_fan_speed" => {
            let fan_speed = require_str_param(command, "fan_speed", &FAN_SPEEDS)?;
            Ok(json!({ "fan_speed": fan_speed }))
        }
        "set_swing" => {
            let swing = bool_param(command, "swing").unwrap_or(false);
            Ok(json!({ "swing": swing }))
        }
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_defaults_mode_cool_and_clamps_temp() {
        let state = coerce(&json!({ "on": true, "temp": 10 }), 1);
        let DeviceState::AirConditioner(state) = state else { panic!("ac") };
        assert!(state.on);
        assert_eq!(state.temp, 16.0);
        assert_eq!(state.mode, "cool");
    }

    #[test]
    fn dry_and_fan_modes_are_valid() {
        for mode in ["dry", "fan"] {
            let state = coerce(&json!({ "mode": mode }), 1);
            assert!(validate(&state).is_empty(), "mode {} rejected", mode);
        }
    }

    #[test]
    fn set_swing_normalizes_to_bool_fragment() {
        let command = DeviceCommand::new("set_swing").with_param("swing", 1);
        assert!(validate_command(&command).is_empty());
        assert_eq!(
            process_command(&command, 1).expect("payload"),
            json!({ "swing": true })
        );
    }
}
