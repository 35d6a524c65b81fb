use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crossdock_availability::DebitError;
use crossdock_core::DomainError;
use crossdock_ledger::StoreError;
use crossdock_transfers::WorkflowError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        DomainError::InvalidTransition(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", message)
        }
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", message),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Backend(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
        StoreError::Unavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", err.to_string())
        }
    }
}

pub fn debit_error_to_response(err: DebitError) -> axum::response::Response {
    match err {
        DebitError::Insufficient { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        // Retriable: resubmit with `override_zero_stock: true`.
        DebitError::ZeroStockUnconfirmed { .. } => {
            json_error(StatusCode::CONFLICT, "zero_stock_unconfirmed", err.to_string())
        }
    }
}

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    match err {
        WorkflowError::Domain(e) => domain_error_to_response(e),
        WorkflowError::Store(e) => store_error_to_response(e),
        WorkflowError::Debit { source, .. } => debit_error_to_response(source),
        WorkflowError::PartialApplication {
            transfer_id,
            applied,
            attempted,
            outcomes,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "partial_application",
                "message": format!(
                    "{applied} of {attempted} items applied; already-applied items are kept, retry applies the rest"
                ),
                "transfer_id": transfer_id,
                "applied": applied,
                "attempted": attempted,
                "outcomes": outcomes,
            })),
        )
            .into_response(),
    }
}
