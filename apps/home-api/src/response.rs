//! 统一响应格式与错误映射。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use home_manager::ManagerError;
use home_profiles::ProfileError;
use serde::Serialize;

/// 统一 API 响应包装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 编排层错误到 HTTP 状态码与错误码的映射。
pub fn manager_error(err: ManagerError) -> Response {
    let (status, code) = match &err {
        ManagerError::DeviceNotFound(_) => (StatusCode::NOT_FOUND, "RESOURCE.NOT_FOUND"),
        ManagerError::DeviceExists(_) => (StatusCode::CONFLICT, "RESOURCE.CONFLICT"),
        ManagerError::InvalidCommand(_)
        | ManagerError::UnknownDeviceType(_)
        | ManagerError::Payload(_)
        | ManagerError::InvalidState(_)
        | ManagerError::Profile(
            ProfileError::UnsupportedCommand(_) | ProfileError::InvalidParam(_),
        ) => (StatusCode::BAD_REQUEST, "INVALID.REQUEST"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR"),
    };
    (status, Json(ApiResponse::<()>::error(code, err.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_error_field() {
        let json = serde_json::to_value(ApiResponse::success(serde_json::json!({"a": 1})))
            .expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["a"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_carries_code_and_message() {
        let json = serde_json::to_value(ApiResponse::<()>::error("INVALID.REQUEST", "bad type"))
            .expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "INVALID.REQUEST");
        assert_eq!(json["error"]["message"], "bad type");
        assert!(json.get("data").is_none());
    }
}
