//! HTTP API 服务器：组合根。
//!
//! 装配存储、画像注册表、命令下发与 MQTT 采集源，
//! 并暴露设备 CRUD / 命令下发 / 审计查询的 REST 接口。

mod handlers;
mod response;
mod routes;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use home_config::AppConfig;
use home_control::{CommandDispatcher, MqttDispatcher, MqttDispatcherConfig, NoopDispatcher};
use home_ingest::{MqttSource, MqttSourceConfig, RawMessageHandler, Source};
use home_manager::{DeviceManager, ManagerStores};
use home_profiles::ProfileRegistry;
use home_storage::{
    PgBaseDeviceStore, PgBaseSensorDataStore, PgDeviceLogStore, PgSensorDataStore,
    PgSmartDeviceStore, PgStateHistoryStore, RedisCurrentValueStore, connect_pool,
};
use home_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<DeviceManager>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let pool = connect_pool(&config.database_url).await?;
    let stores = ManagerStores {
        devices: Arc::new(PgSmartDeviceStore::new(pool.clone())),
        history: Arc::new(PgStateHistoryStore::new(pool.clone())),
        logs: Arc::new(PgDeviceLogStore::new(pool.clone())),
        sensor_data: Arc::new(PgSensorDataStore::new(pool.clone())),
        base_devices: Arc::new(PgBaseDeviceStore::new(pool.clone())),
        base_sensor_data: Arc::new(PgBaseSensorDataStore::new(pool)),
        current_values: Arc::new(RedisCurrentValueStore::connect_with_ttl(
            &config.redis_url,
            config.redis_current_value_ttl_seconds,
        )?),
    };

    let dispatcher: Arc<dyn CommandDispatcher> = if config.control_enabled {
        let (dispatcher, _eventloop) = MqttDispatcher::connect(MqttDispatcherConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            device_prefix: config.mqtt_device_prefix.clone(),
            qos: config.mqtt_command_qos,
        })?;
        Arc::new(dispatcher)
    } else {
        Arc::new(NoopDispatcher)
    };

    let manager = Arc::new(DeviceManager::new(
        Arc::new(ProfileRegistry::standard()),
        stores,
        dispatcher,
        config.mqtt_device_prefix.clone(),
    ));

    if config.ingest_enabled {
        let source = Arc::new(MqttSource::new(MqttSourceConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            device_prefix: config.mqtt_device_prefix.clone(),
        }));
        let handler: Arc<dyn RawMessageHandler> = manager.clone();
        tokio::spawn(async move {
            if let Err(err) = source.run(handler).await {
                tracing::error!(target: "home.api", "mqtt source stopped: {}", err);
            }
        });
    }

    let state = AppState { manager };
    let app = routes::create_api_router()
        .with_state(state)
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!(target: "home.api", addr = %config.http_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// 注入 request_id/trace_id：写入请求扩展、日志 span 与响应头。
async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
