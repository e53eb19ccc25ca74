use axum::Router;

pub mod common;
pub mod coupons;
pub mod inventory;
pub mod materials;
pub mod orders;
pub mod purchase_orders;
pub mod reports;
pub mod shipments;
pub mod system;

/// Router for every record and report endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/coupons", coupons::router())
        .nest("/materials", materials::router())
        .nest("/orders", orders::router())
        .nest("/inventory", inventory::router())
        .nest("/shipments", shipments::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/reports", reports::router())
}
