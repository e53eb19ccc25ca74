use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(create_shipment))
}

pub async fn create_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateShipmentRequest>,
) -> axum::response::Response {
    let shipment = match body.into_shipment(Utc::now().date_naive()) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ship(shipment).await {
        Ok(saved) => (StatusCode::CREATED, Json(dto::shipment_to_json(&saved))).into_response(),
        Err(e) => errors::write_error_to_response(e),
    }
}
