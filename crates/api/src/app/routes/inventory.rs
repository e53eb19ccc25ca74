use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use franchiseops_core::{Entity, FranchiseId};
use franchiseops_inventory::{InventoryItemId, InventoryKey, InventoryRecord};

use crate::app::routes::common::parse_key;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:franchise_id/:item_id", get(get_record).put(put_record))
}

fn parse_path(
    franchise_id: &str,
    item_id: &str,
) -> Result<(FranchiseId, InventoryItemId), axum::response::Response> {
    Ok((parse_key(franchise_id)?, parse_key(item_id)?))
}

/// Insert or replace a record; the status is reclassified on every write.
pub async fn put_record(
    Extension(services): Extension<Arc<AppServices>>,
    Path((franchise_id, item_id)): Path<(String, String)>,
    Json(body): Json<dto::PutInventoryRequest>,
) -> axum::response::Response {
    let (franchise_id, item_id) = match parse_path(&franchise_id, &item_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let record = match InventoryRecord::new(
        item_id,
        franchise_id,
        body.quantity_on_hand,
        body.reorder_level,
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.save_inventory(record).await {
        Ok(saved) => (StatusCode::OK, Json(dto::inventory_to_json(&saved))).into_response(),
        Err(e) => errors::write_error_to_response(e),
    }
}

pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Path((franchise_id, item_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (franchise_id, item_id) = match parse_path(&franchise_id, &item_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.db().inventory_record(&franchise_id, &item_id).await {
        Ok(Some(r)) => (StatusCode::OK, Json(dto::inventory_to_json(&r))).into_response(),
        Ok(None) => errors::not_found(
            InventoryRecord::KIND,
            InventoryKey::new(franchise_id, item_id),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
