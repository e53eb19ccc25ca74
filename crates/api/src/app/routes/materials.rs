use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use franchiseops_inventory::MaterialId;

use crate::app::routes::common::parse_key;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_material))
        .route("/:id", get(get_material))
        .route("/:id/shipments", get(list_shipments))
}

pub async fn create_material(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateMaterialRequest>,
) -> axum::response::Response {
    let material = match body.into_material() {
        Ok(m) => m,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.create_material(&material).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::material_to_json(&material))).into_response()
}

pub async fn get_material(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MaterialId = match parse_key(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.db().material(&id).await {
        Ok(Some(m)) => (StatusCode::OK, Json(dto::material_to_json(&m))).into_response(),
        Ok(None) => errors::not_found("material", &id),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MaterialId = match parse_key(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let db = services.db();
    match db.material(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found("material", &id),
        Err(e) => return errors::store_error_to_response(e),
    }

    match db.shipments_for_material(&id).await {
        Ok(shipments) => {
            let items: Vec<_> = shipments.iter().map(dto::shipment_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
