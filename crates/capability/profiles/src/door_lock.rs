//! 智能门锁画像。

use crate::coerce::{base_from_raw, bool_field, clamp_f64, num_field, ts_field};
use crate::{
    DeviceProfile, ProfileError, check_supported_command, validate_base, variant_mismatch,
};
use domain::{DeviceCommand, DeviceState, DeviceType, DoorLockState, ValidationError};
use serde_json::{Value, json};

const SUPPORTED_COMMANDS: [&str; 2] = ["lock", "unlock"];

pub(crate) fn profile() -> DeviceProfile {
    DeviceProfile {
        device_type: DeviceType::DoorLock,
        coerce,
        validate,
        validate_command,
        process_command,
    }
}

fn coerce(raw: &Value, now_ms: i64) -> DeviceState {
    DeviceState::DoorLock(DoorLockState {
        base: base_from_raw(raw, now_ms),
        locked: bool_field(raw, "locked", false),
        battery_level: clamp_f64(num_field(raw, "battery_level", 100.0), 0.0, 100.0).value,
        last_lock_time: ts_field(raw, "last_lock_time", now_ms),
        last_unlock_time: ts_field(raw, "last_unlock_time", now_ms),
    })
}

fn validate(state: &DeviceState) -> Vec<ValidationError> {
    let DeviceState::DoorLock(state) = state else {
        return variant_mismatch(DeviceType::DoorLock);
    };
    let mut errors = validate_base(&state.base);
    if !(0.0..=100.0).contains(&state.battery_level) {
        errors.push(ValidationError::new(
            "battery_level",
            "battery_level must be a number between 0 and 100",
        ));
    }
    errors
}

fn validate_command(command: &DeviceCommand) -> Vec<ValidationError> {
    // lock/unlock 无额外参数
    check_supported_command(command, &SUPPORTED_COMMANDS)
        .into_iter()
        .collect()
}

fn process_command(command: &DeviceCommand, _now_ms: i64) -> Result<Value, ProfileError> {
    match command.command.as_str() {
        "lock" => Ok(json!({ "locked": true })),
        "unlock" => Ok(json!({ "locked": false })),
        other => Err(ProfileError::UnsupportedCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_defaults_battery_and_times() {
        let state = coerce(&json!({ "locked": true }), 99);
        let DeviceState::DoorLock(state) = state else { panic!("door lock") };
        assert!(state.locked);
        assert_eq!(state.battery_level, 100.0);
        assert_eq!(state.last_lock_time, 99);
        assert_eq!(state.last_unlock_time, 99);
    }

    #[test]
    fn lock_and_unlock_map_to_locked_fragment() {
        assert_eq!(
            process_command(&DeviceCommand::new("lock"), 1).expect("lock"),
            json!({ "locked": true })
        );
        assert_eq!(
            process_command(&DeviceCommand::new("unlock"), 1).expect("unlock"),
            json!({ "locked": false })
        );
    }

    #[test]
    fn unknown_command_fails_validation() {
        let errors = validate_command(&DeviceCommand::new("open_sesame"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "command");
    }
}
