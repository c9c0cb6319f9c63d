//! 智能插座画像。

use crate::coerce::{base_from_raw, bool_field, clamp_f64, num_field};
use crate::{
    DeviceProfile, ProfileError, check_num_param_range, check_supported_command,
    require_num_param, validate_base, variant_mismatch,
};
use domain::{DeviceCommand, DeviceState, DeviceType, PlugState, ValidationError};
use serde_json::{Value, json};

const SUPPORTED_COMMANDS: [&str; 3] = ["turn_on", "turn_off", "set_timer"];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::Plug,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::Plug(PlugState {
        base: base_from_raw(raw, now_ms),
        on: bool_field(raw, "on", false),
        power_consumption: num_field(raw, "power_consumption", 0.0).max(0.0),
        voltage: clamp_f64(num_field(raw, "voltage", 220.0), 100.0, 240.0).value,
        current: num_field(raw, "current", 0.0).max(0.0),
        power_factor: clamp_f64(num_field(raw, "power_factor", 0.95), 0.8, 1.0).value,
        timer: clamp_f64(num_field(raw, "timer", 0.0), 0.0, 120.0).value,
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::Plug(state) = state else {
        return variant_mismatch(DeviceType::Plug);
    };
    let mut errors = validate_base(&state.base);
    if state.power_consumption < 0.0 {
        errors.push(ValidationError::new(
            "power_consumption",
            "power_consumption must be a non-negative number",
        ));
    }
    if !(100.0..=240.0).contains(&state.voltage) {
        errors.push(ValidationError::new(
            "voltage",
            "voltage must be a number between 100 and 240",
        ));
    }
    if state.current < 0.0 {
        errors.push(ValidationError::new(
            "current",
            "current must be a non-negative number",
        ));
    }
    if !(0.8..=1.0).contains(&state.power_factor) {
        errors.push(ValidationError::new(
            "power_factor",
            "power_factor must be a number between 0.8 and 1",
        ));
    }
    if !(0.0..=120.0).contains(&state.timer) {
        errors.push(ValidationError::new(
            "timer",
            "timer must be a number between 0 and 120",
        ));
    }
    errors
}

fn validate_command(command: &DeviceCommand) -> Vec<ValidationError> {
    if let Some(error) = check_supported_command(command, &SUPPORTED_COMMANDS) {
        return vec![error];
    }
    let mut errors = Vec::new();
    if command.command == "set_timer" {
        errors.extend(check_num_param_range(command, "minutes", 0.0, 120.0));
    }
    errors
}

fn process_command(command: &DeviceCommand, _now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "turn_on" => Ok(json!({ "on": true })),
        "turn_off" => Ok(json!({ "on": false })),
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
    fn coerce_defaults_electrical_fields() {
        let state = coerce(&json!({ "on": true }), 1);
        let DeviceState::Plug(state) = state else { panic!("plug") };
        assert!(state.on);
        assert_eq!(state.voltage, 220.0);
        assert_eq!(state.power_factor, 0.95);
        assert_eq!(state.current, 0.0);
        assert_eq!(state.timer, 0.0);
    }

    #[test]
    fn coerce_clamps_voltage_and_power_factor() {
        let state = coerce(&json!({ "voltage": 400, "power_factor": 0.2 }), 1);
        let DeviceState::Plug(state) = state else { panic!("plug") };
        assert_eq!(state.voltage, 240.0);
        assert_eq!(state.power_factor, 0.8);
    }

    #[test]
    fn set_timer_maps_minutes_to_timer_fragment() {
        let command = DeviceCommand::new("set_timer").with_param("minutes", 45);
        assert!(validate_command(&command).is_empty());
        assert_eq!(
            process_command(&command, 1).expect("payload"),
            json!({ "timer": 45.0 })
        );
    }
}
