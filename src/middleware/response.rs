use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;

/// Successful JSON reply, always 200, wrapped as `{"success": true, "data": ...}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize>(T);

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self(data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.0) {
            Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                ApiError::internal("Failed to serialize response data").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;
    use std::collections::HashMap;

    async fn body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn wraps_data_in_success_envelope() {
        let response = ApiResponse::success(json!({"status": "ok"})).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn unserializable_data_becomes_error_envelope() {
        // JSON object keys must be strings
        let data: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        let response = ApiResponse::success(data).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }
}
