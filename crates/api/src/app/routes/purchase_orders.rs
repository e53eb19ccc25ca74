use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use franchiseops_purchasing::PoNumber;

use crate::app::routes::common::parse_key;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(process_purchase_order))
        .route("/:po_number", get(get_purchase_order))
}

pub async fn process_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreatePurchaseOrderRequest>,
) -> axum::response::Response {
    let request = match body.into_command() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.process_purchase_order(&request).await {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::purchase_order_error_to_response(e),
    }
}

pub async fn get_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(po_number): Path<String>,
) -> axum::response::Response {
    let po_number: PoNumber = match parse_key(&po_number) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.db().purchase_order(&po_number).await {
        Ok(Some(po)) => (StatusCode::OK, Json(dto::purchase_order_to_json(&po))).into_response(),
        Ok(None) => errors::not_found("purchase_order", &po_number),
        Err(e) => errors::store_error_to_response(e),
    }
}
