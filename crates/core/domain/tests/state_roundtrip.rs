use domain::{DeviceState, DeviceType, ThermostatState};
use serde_json::json;

#[test]
fn state_tag_matches_resolved_type() {
    let json = json!({
        "type": "THERMOSTAT",
        "online": true,
        "last_update": 1_700_000_000_000_i64,
        "error_state": null,
        "current_temp": 22.5,
        "target_temp": 24.0,
        "humidity": 50.0,
        "mode": "auto",
        "fan_speed": "auto",
        "power_consumption": 450.0
    });
    let state: DeviceState = serde_json::from_value(json).expect("deserialize");
    assert_eq!(state.device_type(), DeviceType::Thermostat);
    assert_eq!(
        DeviceType::resolve(state.device_type().as_str()).expect("resolve"),
        DeviceType::Thermostat
    );

    match state {
        DeviceState::Thermostat(ThermostatState { current_temp, .. }) => {
            assert_eq!(current_temp, 22.5);
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn error_state_survives_snapshot_roundtrip() {
    let json = json!({
        "type": "DOOR_LOCK",
        "online": false,
        "last_update": 1_700_000_000_000_i64,
        "error_state": "battery critically low",
        "locked": true,
        "battery_level": 3.0,
        "last_lock_time": 0,
        "last_unlock_time": 0
    });
    let state: DeviceState = serde_json::from_value(json.clone()).expect("deserialize");
    assert_eq!(
        state.base().error_state.as_deref(),
        Some("battery critically low")
    );
    assert_eq!(serde_json::to_value(&state).expect("serialize"), json);
}
