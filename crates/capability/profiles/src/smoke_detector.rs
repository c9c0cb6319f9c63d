//! 烟雾探测器画像。

use crate::coerce::{base_from_raw, bool_field, clamp_f64, num_field, ts_field};
use crate::{
    DeviceProfile, ProfileError, check_supported_command, validate_base, variant_mismatch,
};
use domain::{DeviceCommand, DeviceState, DeviceType, SmokeDetectorState, ValidationError};
use serde_json::{Value, json};

const SUPPORTED_COMMANDS: [&str; 2] = ["reset_alarm", "test"];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::SmokeDetector,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::SmokeDetector(SmokeDetectorState {
        base: base_from_raw(raw, now_ms),
        alarm: bool_field(raw, "alarm", false),
        battery_level: clamp_f64(num_field(raw, "battery_level", 100.0), 0.0, 100.0).value,
        smoke_level: clamp_f64(num_field(raw, "smoke_level", 0.0), 0.0, 100.0).value,
        last_test_time: ts_field(raw, "last_test_time", now_ms),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::SmokeDetector(state) = state else {
        return variant_mismatch(DeviceType::SmokeDetector);
    };
    let mut errors = validate_base(&state.base);
    if !(0.0..=100.0).contains(&state.battery_level) {
        errors.push(ValidationError::new(
            "battery_level",
            "battery_level must be a number between 0 and 100",
        ));
    }
    if !(0.0..=100.0).contains(&state.smoke_level) {
        errors.push(ValidationError::new(
            "smoke_level",
            "smoke_level must be a number between 0 and 100",
        ));
    }
    errors
}

fn validate_command(command: &DeviceCommand) -> Vec<ValidationError> {
    // reset_alarm/test 无额外参数
    check_supported_command(command, &SUPPORTED_COMMANDS)
        .into_iter()
        .collect()
}

fn process_command(command: &DeviceCommand, now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "reset_alarm" => Ok(json!({ "alarm": false })),
        "test" => Ok(json!({ "last_test_time": now_ms })),
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}
