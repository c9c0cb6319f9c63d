//! 智能灯画像。

use crate::coerce::{base_from_raw, clamp_f64, num_field, str_field};
use crate::{
    DeviceProfile, ProfileError, check_num_param_range, check_supported_command, echo_command,
    require_num_param, validate_base, variant_mismatch,
};
use domain::{DeviceCommand, DeviceState, DeviceType, LightState, ValidationError};
use serde_json::Value;

const SUPPORTED_COMMANDS: [&str; 4] = ["turn_on", "turn_off", "set_brightness", "set_color_temp"];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::Light,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    let state = if str_field(raw, "state", "off") == "on" {
        "on"
    } else {
        "off"
    };
    DeviceState::Light(LightState {
        base: base_from_raw(raw, now_ms),
        state: state.to_string(),
        brightness: clamp_f64(num_field(raw, "brightness", 50.0), 0.0, 100.0).value,
        color_temp: clamp_f64(num_field(raw, "color_temp", 4000.0), 2700.0, 6500.0).value,
        power_consumption: num_field(raw, "power_consumption", 0.0).max(0.0),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::Light(state) = state else {
        return variant_mismatch(DeviceType::Light);
    };
    let mut errors = validate_base(&state.base);
    if state.state != "on" && state.state != "off" {
        errors.push(ValidationError::new("state", "state must be \"on\" or \"off\""));
    }
    if !(0.0..=100.0).contains(&state.brightness) {
        errors.push(ValidationError::new(
            "brightness",
            "brightness must be a number between 0 and 100",
        ));
    }
    if !(2700.0..=6500.0).contains(&state.color_temp) {
        errors.push(ValidationError::new(
            "color_temp",
            "color_temp must be a number between 2700 and 6500",
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
        "set_brightness" => {
            errors.extend(check_num_param_range(command, "brightness", 0.0, 100.0));
        }
        "set_color_temp" => {
            errors.extend(check_num_param_range(command, "color_temp", 2700.0, 6500.0));
        }
        _ => {}
    }
    errors
}

fn process_command(command: &DeviceCommand, _now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "turn_on" | "turn_off" => Ok(echo_command(command)),
        "set_brightness" => {
            require_num_param(command, "brightness", 0.0, 100.0)?;
            Ok(echo_command(command))
        }
        "set_color_temp" => {
            require_num_param(command, "color_temp", 2700.0, 6500.0)?;
            Ok(echo_command(command))
        }
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}
