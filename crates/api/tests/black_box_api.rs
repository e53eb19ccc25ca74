use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::json;

use franchiseops_api::app::{AppServices, build_app_with};
use franchiseops_core::{FranchiseId, InvariantMode};
use franchiseops_infra::{InMemoryDatabase, ReferenceData};
use franchiseops_reporting::{Feedback, Franchise, Owner, OwnerId};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let db = InMemoryDatabase::new();
        db.set_reference_data(reference_data())
            .expect("failed to load reference data");
        let services = AppServices::new(Arc::new(db), InvariantMode::Strict);

        // Same router as prod, bound to an ephemeral port.
        let app = build_app_with(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(serde_json::Value::Null))
    }

    async fn put(&self, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(serde_json::Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(serde_json::Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn reference_data() -> ReferenceData {
    let fid = |raw: &str| FranchiseId::new(raw).unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    ReferenceData {
        owners: vec![Owner {
            id: OwnerId::new("OWN-1").unwrap(),
            name: "Ada".to_string(),
        }],
        franchises: vec![
            Franchise {
                id: fid("FR-1"),
                name: "Downtown".to_string(),
                owner_id: OwnerId::new("OWN-1").unwrap(),
                seating_capacity: 40,
            },
            Franchise {
                id: fid("FR-2"),
                name: "Harbour".to_string(),
                owner_id: OwnerId::new("OWN-1").unwrap(),
                seating_capacity: 20,
            },
        ],
        feedback: vec![
            Feedback {
                franchise_id: fid("FR-1"),
                rating: 5,
                submitted_on: day,
            },
            Feedback {
                franchise_id: fid("FR-2"),
                rating: 3,
                submitted_on: day,
            },
        ],
        ..ReferenceData::default()
    }
}

async fn create_coupon(srv: &TestServer) {
    let (status, _) = srv
        .post(
            "/coupons",
            json!({
                "code": "SAVE20",
                "min_purchase": 15_000,
                "expires_on": "2099-12-31",
                "discount": 2_000,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn create_material(srv: &TestServer, id: &str, quantity: i64) {
    let (status, body) = srv
        .post("/materials", json!({ "id": id, "name": "Flour", "quantity": quantity }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], quantity);
}

#[tokio::test]
async fn health_check_is_ok() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn coupon_discount_applies_only_above_minimum() {
    let srv = TestServer::spawn().await;
    create_coupon(&srv).await;

    let (status, body) = srv
        .post(
            "/orders",
            json!({ "franchise_id": "FR-1", "subtotal": 20_000, "coupon_code": "SAVE20" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], 18_000);
    assert_eq!(body["discount_applied"], 2_000);

    // Stored total matches what was returned.
    let id = body["id"].as_str().unwrap().to_string();
    let (status, stored) = srv.get(&format!("/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["total"], 18_000);

    let (status, body) = srv
        .post(
            "/orders",
            json!({ "franchise_id": "FR-1", "subtotal": 10_000, "coupon_code": "SAVE20" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], 10_000);
    assert_eq!(body["discount_applied"], 0);
}

#[tokio::test]
async fn unknown_coupon_is_rejected() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/orders",
            json!({ "franchise_id": "FR-1", "subtotal": 20_000, "coupon_code": "NOPE" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn duplicate_coupon_conflicts() {
    let srv = TestServer::spawn().await;
    create_coupon(&srv).await;

    let (status, body) = srv
        .post(
            "/coupons",
            json!({
                "code": "SAVE20",
                "min_purchase": 0,
                "expires_on": "2099-12-31",
                "discount": 100,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate");
}

#[tokio::test]
async fn inventory_status_is_reclassified_on_every_write() {
    let srv = TestServer::spawn().await;
    let path = "/inventory/FR-1/SKU-BUNS";

    let (status, body) = srv
        .put(path, json!({ "quantity_on_hand": 5, "reorder_level": 10 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Low");

    let (_, body) = srv
        .put(path, json!({ "quantity_on_hand": 15, "reorder_level": 10 }))
        .await;
    assert_eq!(body["status"], "Decent");

    let (_, body) = srv
        .put(path, json!({ "quantity_on_hand": 21, "reorder_level": 10 }))
        .await;
    assert_eq!(body["status"], "High");

    let (status, body) = srv.get(path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "High");
    assert_eq!(body["quantity_on_hand"], 21);

    let (status, _) = srv.get("/inventory/FR-1/SKU-MISSING").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn same_item_is_stocked_separately_per_franchise() {
    let srv = TestServer::spawn().await;

    let (status, _) = srv
        .put("/inventory/FR-1/SKU-BUNS", json!({ "quantity_on_hand": 5, "reorder_level": 10 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = srv
        .put("/inventory/FR-2/SKU-BUNS", json!({ "quantity_on_hand": 50, "reorder_level": 10 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, north) = srv.get("/inventory/FR-1/SKU-BUNS").await;
    assert_eq!(north["quantity_on_hand"], 5);
    assert_eq!(north["status"], "Low");

    let (_, south) = srv.get("/inventory/FR-2/SKU-BUNS").await;
    assert_eq!(south["quantity_on_hand"], 50);
    assert_eq!(south["status"], "High");
}

#[tokio::test]
async fn shipment_reserves_one_unit_and_never_oversells() {
    let srv = TestServer::spawn().await;
    create_material(&srv, "MAT-FLOUR", 5).await;
    create_material(&srv, "MAT-EMPTY", 0).await;

    let (status, _) = srv
        .post("/shipments", json!({ "material_id": "MAT-FLOUR", "franchise_id": "FR-1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, material) = srv.get("/materials/MAT-FLOUR").await;
    assert_eq!(material["quantity"], 4);

    let (status, body) = srv
        .post("/shipments", json!({ "material_id": "MAT-EMPTY" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let (_, material) = srv.get("/materials/MAT-EMPTY").await;
    assert_eq!(material["quantity"], 0);

    let (status, body) = srv.get("/materials/MAT-FLOUR/shipments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, _) = srv.get("/materials/MAT-EMPTY/shipments").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = srv
        .post("/shipments", json!({ "material_id": "MAT-GHOST" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn purchase_order_restocks_material() {
    let srv = TestServer::spawn().await;
    create_material(&srv, "MAT-OIL", 100).await;

    let (status, body) = srv
        .post(
            "/purchase-orders",
            json!({
                "po_number": "PO-1",
                "material_id": "MAT-OIL",
                "quantity": 500,
                "ordered_on": "2024-06-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["updated_quantity"], 600);
    assert_eq!(body["state"], "Committed");

    let (_, material) = srv.get("/materials/MAT-OIL").await;
    assert_eq!(material["quantity"], 600);

    let (status, po) = srv.get("/purchase-orders/PO-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(po["quantity"], 500);
}

#[tokio::test]
async fn purchase_order_for_missing_material_reports_its_code() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/purchase-orders",
            json!({
                "po_number": "PO-404",
                "material_id": "MAT-GHOST",
                "quantity": 10,
                "ordered_on": "2024-06-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], -20001);
    assert_eq!(body["failed_at"], "Started");
    assert_eq!(body["state"], "RolledBack");

    let (status, _) = srv.get("/purchase-orders/PO-404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_purchase_order_rolls_back() {
    let srv = TestServer::spawn().await;
    create_material(&srv, "MAT-OIL", 100).await;

    let body = json!({
        "po_number": "PO-DUP",
        "material_id": "MAT-OIL",
        "quantity": 50,
        "ordered_on": "2024-06-01",
    });
    let (status, _) = srv.post("/purchase-orders", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = srv.post("/purchase-orders", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], -20002);
    assert_eq!(err["failed_at"], "MaterialValidated");
    assert_eq!(err["state"], "RolledBack");

    let (_, material) = srv.get("/materials/MAT-OIL").await;
    assert_eq!(material["quantity"], 150);
}

#[tokio::test]
async fn reports_read_committed_orders() {
    let srv = TestServer::spawn().await;
    for (franchise, subtotal) in [("FR-1", 30_000), ("FR-2", 10_000)] {
        let (status, _) = srv
            .post("/orders", json!({ "franchise_id": franchise, "subtotal": subtotal }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = srv.get("/reports/feedback-ranking").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["franchise_id"], "FR-1");
    assert_eq!(body["items"][0]["rank"], 1);

    let (status, body) = srv.get("/reports/owner-revenue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["revenue"], 40_000);

    let (status, body) = srv.get("/reports/revenue-share").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["franchise_id"], "FR-1");
    assert_eq!(body["items"][0]["share_pct"], 75.0);

    for path in [
        "/reports/revenue-growth?year=2024",
        "/reports/agreement-inventory",
        "/reports/shift-durations",
        "/reports/profit-per-seat",
        "/reports/staffing",
        "/reports/revenue-per-employee",
        "/reports/expansion?as_of=2024-06-30",
    ] {
        let (status, body) = srv.get(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(body["items"].is_array(), "{path}");
    }
}

#[tokio::test]
async fn revenue_overflow_is_reported_not_wrapped() {
    let srv = TestServer::spawn().await;
    let half = i64::MAX / 2 + 1;
    for franchise in ["FR-1", "FR-2"] {
        let (status, _) = srv
            .post("/orders", json!({ "franchise_id": franchise, "subtotal": half }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    for path in ["/reports/revenue-share", "/reports/owner-revenue"] {
        let (status, body) = srv.get(path).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{path}");
        assert_eq!(body["error"], "invariant_violation", "{path}");
    }

    let (status, _) = srv.get("/reports/feedback-ranking").await;
    assert_eq!(status, StatusCode::OK);
}
