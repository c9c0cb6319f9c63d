//! 智能窗帘画像。

use crate::coerce::{base_from_raw, bool_field, clamp_f64, num_field, ts_field};
use crate::{
    DeviceProfile, ProfileError, check_num_param_range, check_supported_command,
    require_num_param, validate_base, variant_mismatch,
};
use domain::{BlindState, DeviceCommand, DeviceState, DeviceType, ValidationError};
use serde_json::{Value, json};

const SUPPORTED_COMMANDS: [&str; 4] = ["open", "close", "set_position", "set_tilt"];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::Blind,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::Blind(BlindState {
        base: base_from_raw(raw, now_ms),
        position: clamp_f64(num_field(raw, "position", 0.0), 0.0, 100.0).value,
        tilt: clamp_f64(num_field(raw, "tilt", 0.0), 0.0, 180.0).value,
        moving: bool_field(raw, "moving", false),
        last_move_time: ts_field(raw, "last_move_time", now_ms),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::Blind(state) = state else {
        return variant_mismatch(DeviceType::Blind);
    };
    let mut errors = validate_base(&state.base);
    if !(0.0..=100.0).contains(&state.position) {
        errors.push(ValidationError::new(
            "position",
            "position must be a number between 0 and 100",
        ));
    }
    if !(0.0..=180.0).contains(&state.tilt) {
        errors.push(ValidationError::new(
            "tilt",
            "tilt must be a number between 0 and 180",
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
        "set_position" => errors.extend(check_num_param_range(command, "position", 0.0, 100.0)),
        "set_tilt" => errors.extend(check_num_param_range(command, "tilt", 0.0, 180.0)),
        _ => {}
    }
    errors
}

fn process_command(command: &DeviceCommand, _now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "open" => Ok(json!({ "position": 100.0 })),
        "close" => Ok(json!({ "position": 0.0 })),
        "set_position" => {
            let position = require_num_param(command, "position", 0.0, 100.0)?;
            Ok(json!({ "position": position }))
        }
        "set_tilt" => {
            let tilt = require_num_param(command, "tilt", 0.0, 180.0)?;
            Ok(json!({ "tilt": tilt }))
        }
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_clamps_position_and_tilt() {
        let state = coerce(&json!({ "position": 130, "tilt": 200 }), 1);
        let DeviceState::Blind(state) = state else { panic!("blind") };
        assert_eq!(state.position, 100.0);
        assert_eq!(state.tilt, 180.0);
    }

    #[test]
    fn open_close_map_to_position_extremes() {
        assert_eq!(
            process_command(&DeviceCommand::new("open"), 1).expect("open"),
            json!({ "position": 100.0 })
        );
        assert_eq!(
            process_command(&DeviceCommand::new("close"), 1).expect("close"),
            json!({ "position": 0.0 })
        );
    }

    #[test]
    fn set_tilt_validates_range() {
        let command = DeviceCommand::new("set_tilt").with_param("tilt", 270);
        let errors = validate_command(&command);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "tilt");
    }
}
