use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use franchiseops_core::DomainError;
use franchiseops_infra::purchase_orders::{PurchaseOrderError, TransactionCause};
use franchiseops_infra::store::StoreError;
use franchiseops_infra::write_path::WriteError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        StoreError::Duplicate { .. } => json_error(StatusCode::CONFLICT, "duplicate", message),
        StoreError::Missing { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StoreError::Finished | StoreError::Backend(_) => {
            tracing::error!(error = %message, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

pub fn write_error_to_response(err: WriteError) -> axum::response::Response {
    match err {
        WriteError::Domain(e) => domain_error_to_response(e),
        WriteError::Store(e) => store_error_to_response(e),
    }
}

/// Purchase order failures also carry their numeric error code.
pub fn purchase_order_error_to_response(err: PurchaseOrderError) -> axum::response::Response {
    let (status, error) = match &err {
        PurchaseOrderError::MaterialNotFound { .. } => {
            (StatusCode::NOT_FOUND, "material_not_found")
        }
        PurchaseOrderError::Rejected(_) => (StatusCode::BAD_REQUEST, "rejected"),
        PurchaseOrderError::Unexpected {
            cause: TransactionCause::Store(StoreError::Duplicate { .. }),
            ..
        } => (StatusCode::CONFLICT, "unexpected_error"),
        PurchaseOrderError::Unexpected { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "unexpected_error")
        }
    };
    (
        status,
        axum::Json(json!({
            "error": error,
            "code": err.code(),
            "failed_at": err.failed_at().as_str(),
            "state": err.final_state().as_str(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn not_found(entity: &'static str, key: impl core::fmt::Display) -> axum::response::Response {
    domain_error_to_response(DomainError::not_found(entity, key))
}
