use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Uniform response envelope. Success and error payloads share the same
/// shape so clients can parse either branch the same way.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_all_fields() {
        let resp = ApiResponse::ok("SignIn success", serde_json::json!({"k": "v"}));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status_code\":200"));
        assert!(json.contains("SignIn success"));
        assert!(json.contains("\"k\":\"v\""));
    }

    #[test]
    fn created_uses_201() {
        let resp = ApiResponse::created("SignUp success", serde_json::json!({}));
        assert_eq!(resp.status_code, 201);
    }
}
