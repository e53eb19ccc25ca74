use chrono::NaiveDate;
use serde::Deserialize;

use franchiseops_core::{DomainResult, FranchiseId, Money};
use franchiseops_infra::purchase_orders::PurchaseOrderReceipt;
use franchiseops_inventory::{InventoryRecord, MaterialId, RawMaterial, Shipment, ShipmentId};
use franchiseops_purchasing::{PoNumber, ProcessPurchaseOrder, PurchaseOrder};
use franchiseops_sales::{Coupon, CouponCode, Order, OrderId};

// -------------------------
// Request DTOs
// -------------------------

/// Amounts are integers in minor currency units (cents).
#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    pub min_purchase: i64,
    pub expires_on: NaiveDate,
    pub discount: i64,
}

impl CreateCouponRequest {
    pub fn into_coupon(self) -> DomainResult<Coupon> {
        Coupon::new(
            CouponCode::new(&self.code)?,
            Money::from_minor(self.min_purchase),
            self.expires_on,
            Money::from_minor(self.discount),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMaterialRequest {
    pub id: String,
    pub name: String,
    pub quantity: i64,
}

impl CreateMaterialRequest {
    pub fn into_material(self) -> DomainResult<RawMaterial> {
        RawMaterial::new(MaterialId::new(&self.id)?, self.name, self.quantity)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub franchise_id: String,
    pub subtotal: i64,
    pub coupon_code: Option<String>,
    /// Defaults to today.
    pub ordered_on: Option<NaiveDate>,
}

impl CreateOrderRequest {
    pub fn into_order(self, today: NaiveDate) -> DomainResult<Order> {
        let coupon_code = self.coupon_code.as_deref().map(CouponCode::new).transpose()?;
        Ok(Order::new(
            OrderId::generate(),
            FranchiseId::new(&self.franchise_id)?,
            Money::from_minor(self.subtotal),
            coupon_code,
            self.ordered_on.unwrap_or(today),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct PutInventoryRequest {
    pub quantity_on_hand: i64,
    pub reorder_level: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateShipmentRequest {
    pub material_id: String,
    pub franchise_id: Option<String>,
    #[serde(default = "default_shipment_quantity")]
    pub quantity: i64,
    /// Defaults to today.
    pub shipped_on: Option<NaiveDate>,
}

fn default_shipment_quantity() -> i64 {
    1
}

impl CreateShipmentRequest {
    pub fn into_shipment(self, today: NaiveDate) -> DomainResult<Shipment> {
        let franchise_id = self.franchise_id.as_deref().map(FranchiseId::new).transpose()?;
        Ok(Shipment {
            id: ShipmentId::generate(),
            material_id: MaterialId::new(&self.material_id)?,
            franchise_id,
            quantity: self.quantity,
            shipped_on: self.shipped_on.unwrap_or(today),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderRequest {
    pub po_number: String,
    pub material_id: String,
    pub quantity: i64,
    pub ordered_on: NaiveDate,
}

impl CreatePurchaseOrderRequest {
    pub fn into_command(self) -> DomainResult<ProcessPurchaseOrder> {
        Ok(ProcessPurchaseOrder {
            po_number: PoNumber::new(&self.po_number)?,
            material_id: MaterialId::new(&self.material_id)?,
            quantity: self.quantity,
            ordered_on: self.ordered_on,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn coupon_to_json(c: &Coupon) -> serde_json::Value {
    serde_json::json!({
        "code": c.code.as_str(),
        "min_purchase": c.min_purchase.minor(),
        "expires_on": c.expires_on,
        "discount": c.discount.minor(),
    })
}

pub fn material_to_json(m: &RawMaterial) -> serde_json::Value {
    serde_json::json!({
        "id": m.id.as_str(),
        "name": m.name,
        "quantity": m.quantity,
    })
}

pub fn order_to_json(o: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": o.id.to_string(),
        "franchise_id": o.franchise_id.as_str(),
        "subtotal": o.subtotal.minor(),
        "coupon_code": o.coupon_code.as_ref().map(|c| c.as_str()),
        "discount_applied": o.discount_applied().minor(),
        "total": o.total.minor(),
        "ordered_on": o.ordered_on,
    })
}

pub fn inventory_to_json(r: &InventoryRecord) -> serde_json::Value {
    serde_json::json!({
        "franchise_id": r.key.franchise_id.as_str(),
        "item_id": r.key.item_id.as_str(),
        "quantity_on_hand": r.quantity_on_hand,
        "reorder_level": r.reorder_level,
        "status": r.status.as_str(),
    })
}

pub fn shipment_to_json(s: &Shipment) -> serde_json::Value {
    serde_json::json!({
        "id": s.id.to_string(),
        "material_id": s.material_id.as_str(),
        "franchise_id": s.franchise_id.as_ref().map(|f| f.as_str()),
        "quantity": s.quantity,
        "shipped_on": s.shipped_on,
    })
}

pub fn purchase_order_to_json(po: &PurchaseOrder) -> serde_json::Value {
    serde_json::json!({
        "po_number": po.po_number.as_str(),
        "material_id": po.material_id.as_str(),
        "quantity": po.quantity,
        "ordered_on": po.ordered_on,
    })
}

pub fn receipt_to_json(r: &PurchaseOrderReceipt) -> serde_json::Value {
    serde_json::json!({
        "po_number": r.po_number.as_str(),
        "material_id": r.material_id.as_str(),
        "updated_quantity": r.updated_quantity,
        "state": r.state.as_str(),
    })
}
