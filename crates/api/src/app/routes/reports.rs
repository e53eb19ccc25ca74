//! Read-only report endpoints. Each handler loads one committed snapshot
//! and runs a single report over it.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::Serialize;

use franchiseops_core::DomainResult;
use franchiseops_reporting::{self as reporting, ReportingDataset};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/feedback-ranking", get(feedback_ranking))
        .route("/revenue-growth", get(revenue_growth))
        .route("/agreement-inventory", get(agreement_inventory))
        .route("/shift-durations", get(shift_durations))
        .route("/profit-per-seat", get(profit_per_seat))
        .route("/owner-revenue", get(owner_revenue))
        .route("/revenue-share", get(revenue_share))
        .route("/staffing", get(staffing))
        .route("/revenue-per-employee", get(revenue_per_employee))
        .route("/expansion", get(expansion))
}

async fn run<T, F>(services: &AppServices, report: F) -> axum::response::Response
where
    T: Serialize,
    F: FnOnce(&ReportingDataset) -> DomainResult<Vec<T>>,
{
    let ds = match services.db().reporting_dataset().await {
        Ok(ds) => ds,
        Err(e) => return errors::store_error_to_response(e),
    };
    match report(&ds) {
        Ok(rows) => (StatusCode::OK, Json(serde_json::json!({ "items": rows }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}

pub async fn feedback_ranking(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, |ds| Ok(reporting::feedback_ranking(ds))).await
}

pub async fn revenue_growth(
    Extension(services): Extension<Arc<AppServices>>,
    Query(q): Query<dto::YearQuery>,
) -> axum::response::Response {
    let year = q.year.unwrap_or_else(current_year);
    run(&services, |ds| reporting::revenue_growth(ds, year)).await
}

pub async fn agreement_inventory(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, |ds| Ok(reporting::agreement_inventory_ranking(ds))).await
}

pub async fn shift_durations(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, |ds| Ok(reporting::shift_duration_summary(ds))).await
}

pub async fn profit_per_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Query(q): Query<dto::YearQuery>,
) -> axum::response::Response {
    let year = q.year.unwrap_or_else(current_year);
    run(&services, |ds| reporting::profit_per_seat(ds, year)).await
}

pub async fn owner_revenue(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, reporting::owner_revenue_ranking).await
}

pub async fn revenue_share(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, reporting::revenue_share).await
}

pub async fn staffing(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, |ds| Ok(reporting::staffing_ratios(ds))).await
}

pub async fn revenue_per_employee(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    run(&services, reporting::revenue_per_employee).await
}

pub async fn expansion(
    Extension(services): Extension<Arc<AppServices>>,
    Query(q): Query<dto::AsOfQuery>,
) -> axum::response::Response {
    let as_of = q.as_of.unwrap_or_else(|| Utc::now().date_naive());
    run(&services, |ds| Ok(reporting::expansion_candidates(ds, as_of))).await
}
