//! Before-write hooks for orders, inventory records and shipments.

use async_trait::async_trait;
use tracing::debug;

use franchiseops_core::{DomainError, Entity};
use franchiseops_inventory::{InventoryRecord, RawMaterial, Shipment, reserve_for_shipment};
use franchiseops_sales::{Order, apply_pricing};

use super::{BeforeWrite, WriteContext, WriteError};
use crate::store::UnitOfWork;

/// Sets the order total from its subtotal and coupon.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderPricingHook;

#[async_trait]
impl BeforeWrite<Order> for OrderPricingHook {
    fn name(&self) -> &'static str {
        "order-pricing"
    }

    async fn before_write(
        &self,
        uow: &mut dyn UnitOfWork,
        order: &mut Order,
        ctx: &WriteContext,
    ) -> Result<(), WriteError> {
        let coupon = match &order.coupon_code {
            Some(code) => uow.find_coupon(code).await?,
            None => None,
        };
        apply_pricing(order, coupon.as_ref(), ctx.today, ctx.mode)?;
        debug!(order_id = %order.id, total = %order.total, "order priced");
        Ok(())
    }
}

/// Recomputes the derived stock status.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockStatusHook;

#[async_trait]
impl BeforeWrite<InventoryRecord> for StockStatusHook {
    fn name(&self) -> &'static str {
        "stock-status"
    }

    async fn before_write(
        &self,
        _uow: &mut dyn UnitOfWork,
        record: &mut InventoryRecord,
        _ctx: &WriteContext,
    ) -> Result<(), WriteError> {
        record.refresh_status()?;
        Ok(())
    }
}

/// Locks the shipment's material and takes one unit from it.
///
/// The lock is held until the enclosing unit of work ends, so concurrent
/// shipments of the same material queue behind each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShipmentStockGuard;

#[async_trait]
impl BeforeWrite<Shipment> for ShipmentStockGuard {
    fn name(&self) -> &'static str {
        "shipment-stock-guard"
    }

    async fn before_write(
        &self,
        uow: &mut dyn UnitOfWork,
        shipment: &mut Shipment,
        _ctx: &WriteContext,
    ) -> Result<(), WriteError> {
        let material = uow
            .lock_material(&shipment.material_id)
            .await?
            .ok_or_else(|| DomainError::not_found(RawMaterial::KIND, &shipment.material_id))?;

        let remaining = reserve_for_shipment(&material)?;
        uow.update_material_quantity(&material.id, remaining).await?;
        debug!(
            material_id = %material.id,
            shipment_id = %shipment.id,
            remaining,
            "stock reserved for shipment"
        );
        Ok(())
    }
}
