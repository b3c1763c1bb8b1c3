//! Uniform response envelope

use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body shape shared by every endpoint; `status_code` mirrors the HTTP status
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub status_code: u16,
    pub error: Option<String>,
    pub data: Option<T>,
}

/// Successful handler response
#[derive(Debug)]
pub struct ApiResponse<T = ()> {
    status: StatusCode,
    message: String,
    data: Option<T>,
    headers: HeaderMap,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a response header. Values that are not valid header text are
    /// skipped; tokens and ids are always ASCII.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(HeaderName::from_static(name), value);
        }
        self
    }
}

impl ApiResponse<()> {
    /// 200 with `data: null`
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
            headers: HeaderMap::new(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            message: self.message,
            status_code: self.status.as_u16(),
            error: None,
            data: self.data,
        };
        (self.status, self.headers, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = Envelope::<()> {
            message: "Seller created".to_string(),
            status_code: 200,
            error: None,
            data: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "Seller created",
                "status_code": 200,
                "error": null,
                "data": null
            })
        );
    }

    #[test]
    fn test_headers_and_status() {
        let response = ApiResponse::ok("Created", vec![1, 2])
            .with_header("access_token", "abc.def.ghi")
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access_token"], "abc.def.ghi");
    }
}
