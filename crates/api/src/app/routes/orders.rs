use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use franchiseops_core::RecordId;
use franchiseops_sales::OrderId;

use crate::app::routes::common::parse_key;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order))
        .route("/:id", get(get_order))
}

/// The stored total is computed by the pricing hook, never taken from the body.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let order = match body.into_order(Utc::now().date_naive()) {
        Ok(o) => o,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.place_order(order).await {
        Ok(saved) => (StatusCode::CREATED, Json(dto::order_to_json(&saved))).into_response(),
        Err(e) => errors::write_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_key::<RecordId>(&id) {
        Ok(v) => OrderId::new(v),
        Err(resp) => return resp,
    };

    match services.db().order(id).await {
        Ok(Some(o)) => (StatusCode::OK, Json(dto::order_to_json(&o))).into_response(),
        Ok(None) => errors::not_found("order", id),
        Err(e) => errors::store_error_to_response(e),
    }
}
