//! 路由定义
//!
//! 集中管理所有 API 路由：
//! - 健康检查与指标：/health, /metrics
//! - 设备管理：/devices, /devices/{device_id}
//! - 命令下发：/devices/{device_id}/commands
//! - 审计查询：/devices/{device_id}/history, /devices/{device_id}/logs

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .route("/devices", get(list_devices).post(create_device))
        .route(
            "/devices/:device_id",
            get(get_device).delete(delete_device),
        )
        .route("/devices/:device_id/commands", post(send_command))
        .route("/devices/:device_id/history", get(list_history))
        .route("/devices/:device_id/logs", get(list_logs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use home_control::NoopDispatcher;
    use home_manager::{DeviceManager, ManagerStores};
    use home_profiles::ProfileRegistry;
    use home_storage::{
        InMemoryBaseDeviceStore, InMemoryBaseSensorDataStore, InMemoryCurrentValueStore,
        InMemoryDeviceLogStore, InMemorySensorDataStore, InMemorySmartDeviceStore,
        InMemoryStateHistoryStore,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let stores = ManagerStores {
            devices: Arc::new(InMemorySmartDeviceStore::new()),
            history: Arc::new(InMemoryStateHistoryStore::new()),
            logs: Arc::new(InMemoryDeviceLogStore::new()),
            sensor_data: Arc::new(InMemorySensorDataStore::new()),
            base_devices: Arc::new(InMemoryBaseDeviceStore::new()),
            base_sensor_data: Arc::new(InMemoryBaseSensorDataStore::new()),
            current_values: Arc::new(InMemoryCurrentValueStore::new()),
        };
        let manager = Arc::new(DeviceManager::new(
            Arc::new(ProfileRegistry::standard()),
            stores,
            Arc::new(NoopDispatcher),
            "home/devices",
        ));
        create_api_router().with_state(AppState { manager })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["ok"], true);
    }

    #[tokio::test]
    async fn device_crud_over_http() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/devices",
                json!({ "device_id": "light-1", "type": "light", "name": "lamp" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["state"]["type"], "LIGHT");

        let response = app
            .clone()
            .oneshot(
                Request::get("/devices?type=light")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().expect("array").len(), 1);

        let response = app
            .clone()
            .oneshot(
                Request::get("/devices/light-404")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_type_filter_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::get("/devices?type=toaster")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID.REQUEST");
    }

    #[tokio::test]
    async fn invalid_command_returns_bad_request() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/devices",
                json!({ "device_id": "light-2", "type": "light", "name": "lamp" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/devices/light-2/commands",
                json!({ "command": "set_brightness", "params": { "brightness": 120 } }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(json_request(
                "POST",
                "/devices/light-2/commands",
                json!({ "command": "set_brightness", "params": { "brightness": 80 } }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["dispatched"], true);
        assert_eq!(json["data"]["payload"]["command"], "set_brightness");
    }
}
