use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopfront_core::DomainError;
use shopfront_infra::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::GenerationExhausted { .. } => {
            tracing::error!(error = %err, "product id generation exhausted");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "id_generation_exhausted",
                err.to_string(),
            )
        }
        ServiceError::PersistenceUnavailable(msg) => {
            tracing::error!(error = %msg, "persistence unavailable");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "persistence_unavailable",
                "storage is temporarily unavailable",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InvalidCategory(_) => json_error(StatusCode::BAD_REQUEST, "invalid_category", message),
        DomainError::InvalidQuantity(_) => json_error(StatusCode::BAD_REQUEST, "invalid_quantity", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
    }
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (ServiceError::from(DomainError::not_found("cart")), StatusCode::NOT_FOUND),
            (ServiceError::from(DomainError::InvalidQuantity(0)), StatusCode::BAD_REQUEST),
            (
                ServiceError::from(DomainError::InvalidCategory("Hats".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::GenerationExhausted { attempts: 5 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::PersistenceUnavailable("timed out".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }
}
