use axum::{http::StatusCode, response::IntoResponse, Json};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Pinged by the hosting platform so the instance is not put to sleep.
pub async fn keep_alive() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "message": "Server is up and running",
    }))
}
