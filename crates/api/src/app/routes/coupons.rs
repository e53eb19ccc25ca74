use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(create_coupon))
}

pub async fn create_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCouponRequest>,
) -> axum::response::Response {
    let coupon = match body.into_coupon() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.create_coupon(&coupon).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::coupon_to_json(&coupon))).into_response()
}
