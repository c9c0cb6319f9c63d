//! DeviceManager 集成测试：内存存储 + 记录式下发器。

use async_trait::async_trait;
use domain::DeviceCommand;
use home_control::{CommandDispatch, CommandDispatcher, ControlError};
use home_manager::{DeviceEvent, DeviceManager, ManagerError, ManagerStores, NewDevice};
use home_profiles::ProfileRegistry;
use home_storage::{
    BaseDeviceStore, CurrentValueStore, DeviceFilter, InMemoryBaseDeviceStore,
    InMemoryBaseSensorDataStore, InMemoryCurrentValueStore, InMemoryDeviceLogStore,
    InMemorySensorDataStore, InMemorySmartDeviceStore, InMemoryStateHistoryStore,
    SensorDataRecord, SensorDataStore,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

const PREFIX: &str = "home/devices";

#[derive(Default)]
struct RecordingDispatcher {
    dispatches: Mutex<Vec<CommandDispatch>>,
}

#[async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn dispatch(&self, command: &CommandDispatch) -> Result<(), ControlError> {
        self.dispatches
            .lock()
            .map_err(|_| ControlError::Dispatch("lock failed".to_string()))?
            .push(command.clone());
        Ok(())
    }
}

struct Harness {
    manager: DeviceManager,
    logs: Arc<InMemoryDeviceLogStore>,
    sensor_data: Arc<InMemorySensorDataStore>,
    base_devices: Arc<InMemoryBaseDeviceStore>,
    base_sensor_data: Arc<InMemoryBaseSensorDataStore>,
    current_values: Arc<InMemoryCurrentValueStore>,
    dispatcher: Arc<RecordingDispatcher>,
}

fn harness() -> Harness {
    let devices = Arc::new(InMemorySmartDeviceStore::new());
    let history = Arc::new(InMemoryStateHistoryStore::new());
    let logs = Arc::new(InMemoryDeviceLogStore::new());
    let sensor_data = Arc::new(InMemorySensorDataStore::new());
    let base_devices = Arc::new(InMemoryBaseDeviceStore::new());
    let base_sensor_data = Arc::new(InMemoryBaseSensorDataStore::new());
    let current_values = Arc::new(InMemoryCurrentValueStore::new());
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let stores = ManagerStores {
        devices: devices.clone(),
        history: history.clone(),
        logs: logs.clone(),
        sensor_data: sensor_data.clone(),
        base_devices: base_devices.clone(),
        base_sensor_data: base_sensor_data.clone(),
        current_values: current_values.clone(),
    };
    let manager = DeviceManager::new(
        Arc::new(ProfileRegistry::standard()),
        stores,
        dispatcher.clone(),
        PREFIX,
    );
    Harness {
        manager,
        logs,
        sensor_data,
        base_devices,
        base_sensor_data,
        current_values,
        dispatcher,
    }
}

fn status_topic(id: &str) -> String {
    format!("{PREFIX}/status/{id}")
}

#[tokio::test]
async fn first_status_message_auto_provisions_device() {
    let h = harness();
    let mut events = h.manager.subscribe();

    let payload = json!({
        "type": "light",
        "online": true,
        "state": "on",
        "brightness": 80,
        "color_temp": 4000,
        "power_consumption": 9
    });
    h.manager
        .handle_inbound_message(&status_topic("1"), payload.to_string().as_bytes())
        .await;

    let device = h.manager.get_device("light-1").await.expect("device");
    assert_eq!(device.name, "light-1");
    assert_eq!(device.description.as_deref(), Some("Auto-created light device"));
    assert_eq!(device.device_type, "LIGHT");
    assert_eq!(device.state["type"], "LIGHT");
    assert_eq!(device.state["online"], true);
    assert_eq!(device.state["brightness"], 80.0);
    assert!(device.state["error_state"].is_null());

    let history = h.manager.list_history("light-1", 10).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason.as_deref(), Some("state update"));

    match events.recv().await.expect("created event") {
        DeviceEvent::DeviceCreated { device_id } => assert_eq!(device_id, "light-1"),
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("updated event") {
        DeviceEvent::DeviceStateUpdated { device_id, .. } => assert_eq!(device_id, "light-1"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_state_puts_known_device_into_error_state() {
    let h = harness();
    let good = json!({ "type": "thermostat", "online": true, "current_temp": 22, "target_temp": 22 });
    h.manager
        .handle_inbound_message(&status_topic("7"), good.to_string().as_bytes())
        .await;
    assert!(h.manager.get_device("thermostat-7").await.is_ok());

    // mode 非法：转换保留原值，校验层拒绝，设备进入错误状态。
    let bad = json!({ "type": "thermostat", "online": true, "mode": "turbo" });
    h.manager
        .handle_inbound_message(&status_topic("7"), bad.to_string().as_bytes())
        .await;

    let device = h.manager.get_device("thermostat-7").await.expect("device");
    assert_eq!(device.state["online"], false);
    let error_state = device.state["error_state"].as_str().expect("error state");
    assert!(error_state.contains("mode"), "unexpected error: {error_state}");

    let logs = h.logs.all_for_device("thermostat-7");
    assert!(
        logs.iter()
            .any(|log| log.level == domain::LogLevel::Error
                && log.log_type == domain::LogType::Error),
        "expected an ERROR log entry"
    );
}

#[tokio::test]
async fn unparseable_payload_touches_no_device() {
    let h = harness();
    h.manager
        .handle_inbound_message(&status_topic("1"), b"not json")
        .await;
    h.manager
        .handle_inbound_message(&status_topic("1"), json!({ "type": "toaster" }).to_string().as_bytes())
        .await;
    let devices = h
        .manager
        .list_devices(&DeviceFilter::default())
        .await
        .expect("list");
    assert!(devices.is_empty());
}

#[tokio::test]
async fn command_validation_failure_blocks_publish() {
    let h = harness();
    h.manager
        .create_device(NewDevice {
            device_id: "light-3".to_string(),
            device_type: domain::DeviceType::Light,
            name: "desk lamp".to_string(),
            description: None,
            location: Some("study".to_string()),
        })
        .await
        .expect("create");

    let command = DeviceCommand::new("set_brightness").with_param("brightness", 120);
    let err = h
        .manager
        .send_command("light-3", command)
        .await
        .expect_err("out of range");
    assert!(matches!(err, ManagerError::InvalidCommand(_)));
    assert!(h.dispatcher.dispatches.lock().expect("lock").is_empty());

    let command = DeviceCommand::new("set_brightness").with_param("brightness", 80);
    let payload = h
        .manager
        .send_command("light-3", command)
        .await
        .expect("dispatch");
    assert_eq!(payload["command"], "set_brightness");

    let dispatches = h.dispatcher.dispatches.lock().expect("lock");
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].device_id, "light-3");
    assert_eq!(dispatches[0].mqtt_id, "3");

    let logs = h.logs.all_for_device("light-3");
    assert!(
        logs.iter()
            .any(|log| log.log_type == domain::LogType::Command),
        "expected a COMMAND log entry"
    );
}

#[tokio::test]
async fn command_for_unknown_device_fails() {
    let h = harness();
    let err = h
        .manager
        .send_command("light-404", DeviceCommand::new("turn_on"))
        .await
        .expect_err("unknown device");
    assert!(matches!(err, ManagerError::DeviceNotFound(_)));
    assert!(h.dispatcher.dispatches.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn thermostat_runtime_accumulates_across_readings() {
    let h = harness();
    let now = domain::now_epoch_ms();
    // 预置一条 10 分钟前、累计 30 分钟的记录。
    h.sensor_data
        .append_reading(SensorDataRecord {
            record_id: "seed".to_string(),
            device_id: "thermostat-5".to_string(),
            device_type: "THERMOSTAT".to_string(),
            fields: json!({}),
            power_consumption: Some(500.0),
            runtime_minutes: Some(30.0),
            energy_efficiency: Some(0.01),
            timestamp_ms: now - 10 * 60_000,
        })
        .await
        .expect("seed");

    let payload = json!({
        "type": "thermostat",
        "online": true,
        "current_temp": 24,
        "target_temp": 22,
        "power_consumption": 500
    });
    h.manager
        .handle_inbound_message(&status_topic("5"), payload.to_string().as_bytes())
        .await;

    let latest = h
        .sensor_data
        .latest_with_runtime("thermostat-5")
        .await
        .expect("lookup")
        .expect("record");
    assert_eq!(latest.runtime_minutes, Some(40.0));
    assert_eq!(latest.energy_efficiency, Some(2.0 / 500.0));
    assert_eq!(latest.fields["cooling_power"], 0.0);
    assert_eq!(latest.fields["heating_power"], 0.0);
}

#[tokio::test]
async fn temperature_deviation_writes_warning_log() {
    let h = harness();
    let payload = json!({ "type": "thermostat", "online": true, "current_temp": 28, "target_temp": 22 });
    h.manager
        .handle_inbound_message(&status_topic("9"), payload.to_string().as_bytes())
        .await;

    let warnings: Vec<_> = h
        .logs
        .all_for_device("thermostat-9")
        .into_iter()
        .filter(|log| log.level == domain::LogLevel::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("temperature deviation"));

    // 偏差在阈值内时不告警。
    let payload = json!({ "type": "thermostat", "online": true, "current_temp": 24, "target_temp": 22 });
    h.manager
        .handle_inbound_message(&status_topic("10"), payload.to_string().as_bytes())
        .await;
    assert!(
        h.logs
            .all_for_device("thermostat-10")
            .into_iter()
            .all(|log| log.level != domain::LogLevel::Warning)
    );
}

#[tokio::test]
async fn base_sensor_message_updates_status_and_cache() {
    let h = harness();
    let payload = json!({ "type": "temperature", "id": "42", "value": 0, "location": { "room": "attic" } });
    h.manager
        .handle_inbound_message("home/sensors/temperature", payload.to_string().as_bytes())
        .await;

    // 设备按 {类型}-{载荷 id} 建档，裸 id 不产生记录。
    let device = h
        .base_devices
        .find_base_device("temperature-42")
        .await
        .expect("lookup")
        .expect("base device");
    assert_eq!(device.sensor_type, "temperature");
    assert_eq!(device.lower_threshold, 0.0);
    assert_eq!(device.upper_threshold, 100.0);
    // value 0 ≤ 下限 → 状态联动为 on。
    assert_eq!(device.status, "on");
    assert!(
        h.base_devices
            .find_base_device("42")
            .await
            .expect("lookup")
            .is_none()
    );

    let cached = h
        .current_values
        .get_current_value("temperature-42")
        .await
        .expect("cache")
        .expect("value");
    assert_eq!(cached.0, 0.0);
    assert_eq!(cached.1, "on");

    let rows = h.base_sensor_data.all_for_device("temperature-42");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "on");
}

#[tokio::test]
async fn base_sensor_ids_are_namespaced_by_type() {
    let h = harness();
    for (sensor_type, value) in [("temperature", 0), ("humidity", 100)] {
        let payload = json!({ "type": sensor_type, "id": 7, "value": value });
        h.manager
            .handle_inbound_message("home/sensors", payload.to_string().as_bytes())
            .await;
    }

    let temperature = h
        .base_devices
        .find_base_device("temperature-7")
        .await
        .expect("lookup")
        .expect("temperature device");
    assert_eq!(temperature.status, "on");

    let humidity = h
        .base_devices
        .find_base_device("humidity-7")
        .await
        .expect("lookup")
        .expect("humidity device");
    assert_eq!(humidity.sensor_type, "humidity");
    // value 100 ≥ 上限 → off，不受同号温度传感器影响。
    assert_eq!(humidity.status, "off");
}

#[tokio::test]
async fn malformed_base_sensor_payload_is_discarded() {
    let h = harness();
    for payload in [
        b"not json".to_vec(),
        json!({ "type": "temperature" }).to_string().into_bytes(),
        json!({ "id": "42", "value": 1 }).to_string().into_bytes(),
        json!({ "type": "temperature", "id": "42", "value": "warm" })
            .to_string()
            .into_bytes(),
    ] {
        h.manager
            .handle_inbound_message("home/sensors/temperature", &payload)
            .await;
    }
    assert!(
        h.base_devices
            .find_base_device("temperature-42")
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(h.base_sensor_data.all_for_device("temperature-42").is_empty());
}

#[tokio::test]
async fn create_and_delete_device_lifecycle() {
    let h = harness();
    let mut events = h.manager.subscribe();

    let record = h
        .manager
        .create_device(NewDevice {
            device_id: "plug-8".to_string(),
            device_type: domain::DeviceType::Plug,
            name: "heater plug".to_string(),
            description: Some("living room".to_string()),
            location: None,
        })
        .await
        .expect("create");
    assert_eq!(record.state["type"], "PLUG");
    assert_eq!(record.state["online"], true);
    assert_eq!(record.state["voltage"], 220.0);

    let err = h
        .manager
        .create_device(NewDevice {
            device_id: "plug-8".to_string(),
            device_type: domain::DeviceType::Plug,
            name: "duplicate".to_string(),
            description: None,
            location: None,
        })
        .await
        .expect_err("duplicate");
    assert!(matches!(err, ManagerError::DeviceExists(_)));

    h.manager.delete_device("plug-8").await.expect("delete");
    assert!(matches!(
        h.manager.get_device("plug-8").await,
        Err(ManagerError::DeviceNotFound(_))
    ));
    assert!(matches!(
        h.manager.delete_device("plug-8").await,
        Err(ManagerError::DeviceNotFound(_))
    ));

    match events.recv().await.expect("created") {
        DeviceEvent::DeviceCreated { device_id } => assert_eq!(device_id, "plug-8"),
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("deleted") {
        DeviceEvent::DeviceDeleted { device_id } => assert_eq!(device_id, "plug-8"),
        other => panic!("unexpected event: {other:?}"),
    }
}
