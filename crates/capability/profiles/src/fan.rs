//! 风扇画像。

use crate::coerce::{base_from_raw, bool_field, clamp_f64, num_field};
use crate::{
    DeviceProfile, ProfileError, bool_param, check_num_param_range, check_supported_command,
    require_num_param, validate_base, variant_mismatch,
};
use domain::{DeviceCommand, DeviceState, DeviceType, FanState, ValidationError};
use serde_json::{Value, json};

const SUPPORTED_COMMANDS: [&str; 5] = [
    "turn_on",
    "turn_off",
    "set_speed",
    "set_oscillate",
    "set_timer",
];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::Fan,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::Fan(FanState {
        base: base_from_raw(raw, now_ms),
        on: bool_field(raw, "on", false),
        speed: clamp_f64(num_field(raw, "speed", 1.0), 1.0, 3.0).value,
        oscillate: bool_field(raw, "oscillate", false),
        timer: clamp_f64(num_field(raw, "timer", 0.0), 0.0, 120.0).value,
        power_consumption: num_field(raw, "power_consumption", 0.0).max(0.0),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::Fan(state) = state else {
        return variant_mismatch(DeviceType::Fan);
    };
    let mut errors = validate_base(&state.base);
    if !(1.0..=3.0).contains(&state.speed) {
        errors.push(ValidationError::new(
            "speed",
            "speed must be a number between 1 and 3",
        ));
    }
    if !(0.0..=120.0).contains(&state.timer) {
        errors.push(ValidationError::new(
            "timer",
            "timer must be a number between 0 and 120",
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
        "set_speed" => errors.extend(check_num_param_range(command, "speed", 1.0, 3.0)),
        "set_timer" => errors.extend(check_num_param_range(command, "minutes", 0.0, 120.0)),
        _ => {}
    }
    errors
}

fn process_command(command: &DeviceCommand, _now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "turn_on" => Ok(json!({ "on": true })),
        "turn_off" => Ok(json!({ "on": false })),
        "set_speed" => {
            let speed = require_num_param(command, "speed", 1.0, 3.0)?;
            Ok(json!({ "speed": speed }))
        }
        "set_oscillate" => {
            let oscillate = bool_param(command, "oscillate").unwrap_or(false);
            Ok(json!({ "oscillate": oscillate }))
        }
        "set_timer" => {
            let minutes = require_num_param(command, "minutes", 0.0, 120.0)?;
            Ok(json!({ "timer": minutes }))
        }
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_clamps_speed_into_one_to_three() {
        let state = coerce(&json!({ "speed": 9 }), 1);
        let DeviceState::Fan(state) = state else { panic!("fan") };
        assert_eq!(state.speed, 3.0);

        let state = coerce(&json!({ "speed": 0 }), 1);
        let DeviceState::Fan(state) = state else { panic!("fan") };
        assert_eq!(state.speed, 1.0);
    }

    #[test]
    fn set_timer_maps_minutes_param_to_timer_field() {
        let command = DeviceCommand::new("set_timer").with_param("minutes", 30);
        assert!(validate_command(&command).is_empty());
        assert_eq!(
            process_command(&command, 1).expect("payload"),
            json!({ "timer": 30.0 })
        );
    }

    #[test]
    fn set_timer_rejects_minutes_over_limit() {
        let command = DeviceCommand::new("set_timer").with_param("minutes", 600);
        let errors = validate_command(&command);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "minutes");
    }
}
