use home_storage::{
    BaseDeviceRecord, BaseDeviceStore, DeviceFilter, InMemoryBaseDeviceStore,
    InMemorySensorDataStore, InMemorySmartDeviceStore, InMemoryStateHistoryStore,
    SensorDataRecord, SensorDataStore, SmartDeviceRecord, SmartDeviceStore, SmartDeviceUpdate,
    StateHistoryRecord, StateHistoryStore,
};
use serde_json::json;

fn device(device_id: &str, device_type: &str, location: Option<&str>) -> SmartDeviceRecord {
    SmartDeviceRecord {
        device_id: device_id.to_string(),
        device_type: device_type.to_string(),
        name: device_id.to_string(),
        description: None,
        location: location.map(|value| value.to_string()),
        state: json!({ "type": device_type, "online": true }),
        created_at_ms: 1,
        updated_at_ms: 1,
    }
}

#[tokio::test]
async fn upsert_then_find_and_delete() {
    let store = InMemorySmartDeviceStore::new();
    store
        .upsert_device(device("light-1", "LIGHT", None))
        .await
        .expect("upsert");

    let found = store.find_device("light-1").await.expect("find");
    assert!(found.is_some());

    assert!(store.delete_device("light-1").await.expect("delete"));
    assert!(!store.delete_device("light-1").await.expect("delete again"));
}

#[tokio::test]
async fn list_devices_applies_type_and_location_filter() {
    let store = InMemorySmartDeviceStore::new();
    store
        .upsert_device(device("light-1", "LIGHT", Some("living room")))
        .await
        .expect("upsert");
    store
        .upsert_device(device("light-2", "LIGHT", Some("bedroom")))
        .await
        .expect("upsert");
    store
        .upsert_device(device("fan-1", "FAN", Some("living room")))
        .await
        .expect("upsert");

    let all = store.list_devices(&DeviceFilter::default()).await.expect("list");
    assert_eq!(all.len(), 3);

    let lights = store
        .list_devices(&DeviceFilter {
            device_type: Some("LIGHT".to_string()),
            location: None,
        })
        .await
        .expect("list");
    assert_eq!(lights.len(), 2);

    let living_room_lights = store
        .list_devices(&DeviceFilter {
            device_type: Some("LIGHT".to_string()),
            location: Some("living room".to_string()),
        })
        .await
        .expect("list");
    assert_eq!(living_room_lights.len(), 1);
    assert_eq!(living_room_lights[0].device_id, "light-1");
}

#[tokio::test]
async fn update_state_replaces_snapshot_and_bumps_timestamp() {
    let store = InMemorySmartDeviceStore::new();
    store
        .upsert_device(device("light-1", "LIGHT", None))
        .await
        .expect("upsert");

    let updated = store
        .update_state("light-1", &json!({ "type": "LIGHT", "online": false }), 99)
        .await
        .expect("update")
        .expect("device");
    assert_eq!(updated.updated_at_ms, 99);
    assert_eq!(updated.state["online"], json!(false));

    let missing = store
        .update_state("light-9", &json!({}), 99)
        .await
        .expect("update");
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_device_patches_only_provided_fields() {
    let store = InMemorySmartDeviceStore::new();
    store
        .upsert_device(device("plug-1", "PLUG", Some("kitchen")))
        .await
        .expect("upsert");

    let updated = store
        .update_device(
            "plug-1",
            SmartDeviceUpdate {
                name: Some("coffee plug".to_string()),
                ..SmartDeviceUpdate::default()
            },
        )
        .await
        .expect("update")
        .expect("device");
    assert_eq!(updated.name, "coffee plug");
    assert_eq!(updated.location.as_deref(), Some("kitchen"));
}

#[tokio::test]
async fn latest_history_returns_most_recent_entry() {
    let store = InMemoryStateHistoryStore::new();
    for (id, ts) in [("h1", 10), ("h2", 30), ("h3", 20)] {
        store
            .append_history(StateHistoryRecord {
                history_id: id.to_string(),
                device_id: "thermostat-1".to_string(),
                device_type: "THERMOSTAT".to_string(),
                state: json!({}),
                reason: None,
                details: None,
                timestamp_ms: ts,
            })
            .await
            .expect("append");
    }

    let latest = store
        .latest_history("thermostat-1")
        .await
        .expect("query")
        .expect("entry");
    assert_eq!(latest.history_id, "h2");

    let listed = store.list_history("thermostat-1", 2).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].history_id, "h2");
    assert_eq!(listed[1].history_id, "h3");
}

#[tokio::test]
async fn latest_with_runtime_skips_rows_without_runtime() {
    let store = InMemorySensorDataStore::new();
    let mut record = SensorDataRecord {
        record_id: "r1".to_string(),
        device_id: "thermostat-1".to_string(),
        device_type: "THERMOSTAT".to_string(),
        fields: json!({}),
        power_consumption: Some(100.0),
        runtime_minutes: Some(5.0),
        energy_efficiency: None,
        timestamp_ms: 10,
    };
    store.append_reading(record.clone()).await.expect("append");

    record.record_id = "r2".to_string();
    record.runtime_minutes = None;
    record.timestamp_ms = 20;
    store.append_reading(record).await.expect("append");

    let latest = store
        .latest_with_runtime("thermostat-1")
        .await
        .expect("query")
        .expect("entry");
    assert_eq!(latest.record_id, "r1");
    assert_eq!(latest.runtime_minutes, Some(5.0));
}

#[tokio::test]
async fn base_device_status_update() {
    let store = InMemoryBaseDeviceStore::new();
    store
        .upsert_base_device(BaseDeviceRecord {
            device_id: "temperature-7".to_string(),
            sensor_type: "temperature".to_string(),
            location: None,
            lower_threshold: 0.0,
            upper_threshold: 100.0,
            status: "off".to_string(),
            updated_at_ms: 1,
        })
        .await
        .expect("upsert");

    let updated = store
        .update_base_status("temperature-7", "on", 50)
        .await
        .expect("update")
        .expect("device");
    assert_eq!(updated.status, "on");
    assert_eq!(updated.updated_at_ms, 50);
}
