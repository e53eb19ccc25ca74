//! Postgres-backed record store.
//!
//! One database transaction per unit of work. Material locks are taken with
//! `SELECT ... FOR UPDATE` and released when the transaction ends.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `Missing` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / RowNotFound / other | N/A | `Backend` |
//!
//! Rows that fail to decode into domain types (bad ids, unknown status) are
//! reported as `Backend` errors naming the table.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use franchiseops_core::{FranchiseId, Money, RecordId};
use franchiseops_inventory::{
    InventoryItemId, InventoryKey, InventoryRecord, MaterialId, RawMaterial, Shipment, ShipmentId,
    StockStatus,
};
use franchiseops_purchasing::{PoNumber, PurchaseOrder};
use franchiseops_reporting::{
    Agreement, Employee, EmployeeId, EmployeeRole, Feedback, Franchise, OperatingCost, Owner,
    OwnerId, ReportingDataset, Shift,
};
use franchiseops_sales::{Coupon, CouponCode, Order, OrderId};

use super::{Database, StoreError, StoreResult, UnitOfWork};

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `url`.
    #[instrument(skip(url), err)]
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", "pool", "", e))?;
        Ok(Self::new(pool))
    }

    /// Create any missing tables and indexes.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", "schema", "", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn tx(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().ok_or(StoreError::Finished)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    #[instrument(skip(self), fields(code = %code), err)]
    async fn find_coupon(&mut self, code: &CouponCode) -> StoreResult<Option<Coupon>> {
        let row = sqlx::query(
            "SELECT code, min_purchase, expires_on, discount FROM coupons WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&mut **self.tx()?)
        .await
        .map_err(|e| map_sqlx_error("find_coupon", "coupons", code, e))?;
        row.as_ref().map(coupon_from_row).transpose()
    }

    #[instrument(skip(self, coupon), fields(code = %coupon.code), err)]
    async fn insert_coupon(&mut self, coupon: &Coupon) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coupons (code, min_purchase, expires_on, discount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(coupon.code.as_str())
        .bind(coupon.min_purchase.minor())
        .bind(coupon.expires_on)
        .bind(coupon.discount.minor())
        .execute(&mut **self.tx()?)
        .await
        .map_err(|e| map_sqlx_error("insert_coupon", "coupons", &coupon.code, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn lock_material(&mut self, id: &MaterialId) -> StoreResult<Option<RawMaterial>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, quantity
            FROM raw_materials
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut **self.tx()?)
        .await
        .map_err(|e| map_sqlx_error("lock_material", "raw_materials", id, e))?;
        row.as_ref().map(material_from_row).transpose()
    }

    #[instrument(skip(self, material), fields(material_id = %material.id), err)]
    async fn insert_material(&mut self, material: &RawMaterial) -> StoreResult<()> {
        sqlx::query("INSERT INTO raw_materials (id, name, quantity) VALUES ($1, $2, $3)")
            .bind(material.id.as_str())
            .bind(&material.name)
            .bind(material.quantity)
            .execute(&mut **self.tx()?)
            .await
            .map_err(|e| map_sqlx_error("insert_material", "raw_materials", &material.id, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn update_material_quantity(
        &mut self,
        id: &MaterialId,
        quantity: i64,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE raw_materials SET quantity = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(quantity)
            .execute(&mut **self.tx()?)
            .await
            .map_err(|e| map_sqlx_error("update_material_quantity", "raw_materials", id, e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                table: "raw_materials",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = %order.id), err)]
    async fn save_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, franchise_id, subtotal, coupon_code, total, ordered_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                franchise_id = EXCLUDED.franchise_id,
                subtotal = EXCLUDED.subtotal,
                coupon_code = EXCLUDED.coupon_code,
                total = EXCLUDED.total,
                ordered_on = EXCLUDED.ordered_on
            "#,
        )
        .bind(order.id.0.as_uuid())
        .bind(order.franchise_id.as_str())
        .bind(order.subtotal.minor())
        .bind(order.coupon_code.as_ref().map(|c| c.as_str()))
        .bind(order.total.minor())
        .bind(order.ordered_on)
        .execute(&mut **self.tx()?)
        .await
        .map_err(|e| match map_sqlx_error("save_order", "orders", order.id, e) {
            StoreError::Missing { .. } => StoreError::Missing {
                table: "franchises",
                key: order.franchise_id.to_string(),
            },
            other => other,
        })?;
        Ok(())
    }

    #[instrument(
        skip(self, record),
        fields(key = %record.key),
        err
    )]
    async fn save_inventory_record(&mut self, record: &InventoryRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (franchise_id, item_id, quantity_on_hand, reorder_level, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (franchise_id, item_id) DO UPDATE SET
                quantity_on_hand = EXCLUDED.quantity_on_hand,
                reorder_level = EXCLUDED.reorder_level,
                status = EXCLUDED.status
            "#,
        )
        .bind(record.key.franchise_id.as_str())
        .bind(record.key.item_id.as_str())
        .bind(record.quantity_on_hand)
        .bind(record.reorder_level)
        .bind(record.status.as_str())
        .execute(&mut **self.tx()?)
        .await
        .map_err(|e| map_sqlx_error("save_inventory_record", "inventory", &record.key, e))?;
        Ok(())
    }

    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id), err)]
    async fn insert_shipment(&mut self, shipment: &Shipment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shipments (id, material_id, franchise_id, quantity, shipped_on)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(shipment.id.0.as_uuid())
        .bind(shipment.material_id.as_str())
        .bind(shipment.franchise_id.as_ref().map(|f| f.as_str()))
        .bind(shipment.quantity)
        .bind(shipment.shipped_on)
        .execute(&mut **self.tx()?)
        .await
        .map_err(|e| map_sqlx_error("insert_shipment", "shipments", shipment.id, e))?;
        Ok(())
    }

    #[instrument(skip(self, order), fields(po_number = %order.po_number), err)]
    async fn insert_purchase_order(&mut self, order: &PurchaseOrder) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO purchase_orders (po_number, material_id, quantity, ordered_on)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.po_number.as_str())
        .bind(order.material_id.as_str())
        .bind(order.quantity)
        .bind(order.ordered_on)
        .execute(&mut **self.tx()?)
        .await
        .map_err(|e| {
            map_sqlx_error("insert_purchase_order", "purchase_orders", &order.po_number, e)
        })?;
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", "transaction", "", e))
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", "transaction", "", e))
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", "transaction", "", e))?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }

    #[instrument(skip(self), fields(code = %code), err)]
    async fn coupon(&self, code: &CouponCode) -> StoreResult<Option<Coupon>> {
        let row = sqlx::query(
            "SELECT code, min_purchase, expires_on, discount FROM coupons WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("coupon", "coupons", code, e))?;
        row.as_ref().map(coupon_from_row).transpose()
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn material(&self, id: &MaterialId) -> StoreResult<Option<RawMaterial>> {
        let row = sqlx::query("SELECT id, name, quantity FROM raw_materials WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("material", "raw_materials", id, e))?;
        row.as_ref().map(material_from_row).transpose()
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, franchise_id, subtotal, coupon_code, total, ordered_on
            FROM orders WHERE id = $1
            "#,
        )
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order", "orders", id, e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(skip(self), fields(franchise_id = %franchise_id, item_id = %item_id), err)]
    async fn inventory_record(
        &self,
        franchise_id: &FranchiseId,
        item_id: &InventoryItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        let row = sqlx::query(
            r#"
            SELECT franchise_id, item_id, quantity_on_hand, reorder_level, status
            FROM inventory WHERE franchise_id = $1 AND item_id = $2
            "#,
        )
        .bind(franchise_id.as_str())
        .bind(item_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_record", "inventory", item_id, e))?;
        row.as_ref().map(inventory_from_row).transpose()
    }

    #[instrument(skip(self), fields(po_number = %po_number), err)]
    async fn purchase_order(&self, po_number: &PoNumber) -> StoreResult<Option<PurchaseOrder>> {
        let row = sqlx::query(
            r#"
            SELECT po_number, material_id, quantity, ordered_on
            FROM purchase_orders WHERE po_number = $1
            "#,
        )
        .bind(po_number.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchase_order", "purchase_orders", po_number, e))?;
        row.as_ref().map(purchase_order_from_row).transpose()
    }

    #[instrument(skip(self), fields(material_id = %id), err)]
    async fn shipments_for_material(&self, id: &MaterialId) -> StoreResult<Vec<Shipment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, material_id, franchise_id, quantity, shipped_on
            FROM shipments WHERE material_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("shipments_for_material", "shipments", id, e))?;
        rows.iter().map(shipment_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn reporting_dataset(&self) -> StoreResult<ReportingDataset> {
        let owners = self
            .fetch_all("owners", "SELECT id, name FROM owners", owner_from_row)
            .await?;
        let franchises = self
            .fetch_all(
                "franchises",
                "SELECT id, name, owner_id, seating_capacity FROM franchises",
                franchise_from_row,
            )
            .await?;
        let employees = self
            .fetch_all(
                "employees",
                "SELECT id, franchise_id, name, role FROM employees",
                employee_from_row,
            )
            .await?;
        let shifts = self
            .fetch_all(
                "shifts",
                "SELECT employee_id, franchise_id, starts_at, ends_at FROM shifts",
                shift_from_row,
            )
            .await?;
        let feedback = self
            .fetch_all(
                "feedback",
                "SELECT franchise_id, rating, submitted_on FROM feedback",
                feedback_from_row,
            )
            .await?;
        let agreements = self
            .fetch_all(
                "agreements",
                "SELECT franchise_id, starts_on, ends_on FROM agreements",
                agreement_from_row,
            )
            .await?;
        let operating_costs = self
            .fetch_all(
                "operating_costs",
                "SELECT franchise_id, amount, incurred_on FROM operating_costs",
                operating_cost_from_row,
            )
            .await?;
        let orders = self
            .fetch_all(
                "orders",
                "SELECT id, franchise_id, subtotal, coupon_code, total, ordered_on FROM orders",
                order_from_row,
            )
            .await?;
        let inventory = self
            .fetch_all(
                "inventory",
                r#"
                SELECT franchise_id, item_id, quantity_on_hand, reorder_level, status
                FROM inventory
                "#,
                inventory_from_row,
            )
            .await?;

        Ok(ReportingDataset {
            owners,
            franchises,
            employees,
            shifts,
            feedback,
            agreements,
            operating_costs,
            orders,
            inventory,
        })
    }
}

impl PostgresDatabase {
    async fn fetch_all<T>(
        &self,
        table: &'static str,
        sql: &'static str,
        decode: fn(&PgRow) -> StoreResult<T>,
    ) -> StoreResult<Vec<T>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("reporting_dataset", table, "", e))?;
        rows.iter().map(decode).collect()
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(
    operation: &str,
    table: &'static str,
    key: impl Display,
    err: sqlx::Error,
) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate {
                    table,
                    key: key.to_string(),
                },
                // A referenced row (franchise, material) does not exist.
                Some("23503") => StoreError::Missing {
                    table,
                    key: key.to_string(),
                },
                _ => StoreError::Backend(format!(
                    "database error in {}: {}",
                    operation,
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}

fn corrupt(table: &str, err: impl Display) -> StoreError {
    StoreError::Backend(format!("corrupt {table} row: {err}"))
}

fn get<'r, T>(row: &'r PgRow, table: &str, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(|e| corrupt(table, e))
}

fn coupon_from_row(row: &PgRow) -> StoreResult<Coupon> {
    const T: &str = "coupons";
    Ok(Coupon {
        code: CouponCode::new(get::<String>(row, T, "code")?).map_err(|e| corrupt(T, e))?,
        min_purchase: Money::from_minor(get(row, T, "min_purchase")?),
        expires_on: get(row, T, "expires_on")?,
        discount: Money::from_minor(get(row, T, "discount")?),
    })
}

fn material_from_row(row: &PgRow) -> StoreResult<RawMaterial> {
    const T: &str = "raw_materials";
    Ok(RawMaterial {
        id: MaterialId::new(get::<String>(row, T, "id")?).map_err(|e| corrupt(T, e))?,
        name: get(row, T, "name")?,
        quantity: get(row, T, "quantity")?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    const T: &str = "orders";
    let coupon_code = get::<Option<String>>(row, T, "coupon_code")?
        .map(CouponCode::new)
        .transpose()
        .map_err(|e| corrupt(T, e))?;
    Ok(Order {
        id: OrderId::new(RecordId::from_uuid(get(row, T, "id")?)),
        franchise_id: FranchiseId::new(get::<String>(row, T, "franchise_id")?)
            .map_err(|e| corrupt(T, e))?,
        subtotal: Money::from_minor(get(row, T, "subtotal")?),
        coupon_code,
        total: Money::from_minor(get(row, T, "total")?),
        ordered_on: get(row, T, "ordered_on")?,
    })
}

fn inventory_from_row(row: &PgRow) -> StoreResult<InventoryRecord> {
    const T: &str = "inventory";
    let key = InventoryKey::new(
        FranchiseId::new(get::<String>(row, T, "franchise_id")?).map_err(|e| corrupt(T, e))?,
        InventoryItemId::new(get::<String>(row, T, "item_id")?).map_err(|e| corrupt(T, e))?,
    );
    Ok(InventoryRecord {
        key,
        quantity_on_hand: get(row, T, "quantity_on_hand")?,
        reorder_level: get(row, T, "reorder_level")?,
        status: get::<String>(row, T, "status")?
            .parse::<StockStatus>()
            .map_err(|e| corrupt(T, e))?,
    })
}

fn shipment_from_row(row: &PgRow) -> StoreResult<Shipment> {
    const T: &str = "shipments";
    let franchise_id = get::<Option<String>>(row, T, "franchise_id")?
        .map(FranchiseId::new)
        .transpose()
        .map_err(|e| corrupt(T, e))?;
    Ok(Shipment {
        id: ShipmentId::new(RecordId::from_uuid(get(row, T, "id")?)),
        material_id: MaterialId::new(get::<String>(row, T, "material_id")?)
            .map_err(|e| corrupt(T, e))?,
        franchise_id,
        quantity: get(row, T, "quantity")?,
        shipped_on: get(row, T, "shipped_on")?,
    })
}

fn purchase_order_from_row(row: &PgRow) -> StoreResult<PurchaseOrder> {
    const T: &str = "purchase_orders";
    Ok(PurchaseOrder {
        po_number: PoNumber::new(get::<String>(row, T, "po_number")?)
            .map_err(|e| corrupt(T, e))?,
        material_id: MaterialId::new(get::<String>(row, T, "material_id")?)
            .map_err(|e| corrupt(T, e))?,
        quantity: get(row, T, "quantity")?,
        ordered_on: get(row, T, "ordered_on")?,
    })
}

fn owner_from_row(row: &PgRow) -> StoreResult<Owner> {
    const T: &str = "owners";
    Ok(Owner {
        id: OwnerId::new(get::<String>(row, T, "id")?).map_err(|e| corrupt(T, e))?,
        name: get(row, T, "name")?,
    })
}

fn franchise_from_row(row: &PgRow) -> StoreResult<Franchise> {
    const T: &str = "franchises";
    let seats: i32 = get(row, T, "seating_capacity")?;
    Ok(Franchise {
        id: FranchiseId::new(get::<String>(row, T, "id")?).map_err(|e| corrupt(T, e))?,
        name: get(row, T, "name")?,
        owner_id: OwnerId::new(get::<String>(row, T, "owner_id")?).map_err(|e| corrupt(T, e))?,
        seating_capacity: u32::try_from(seats).map_err(|e| corrupt(T, e))?,
    })
}

fn employee_from_row(row: &PgRow) -> StoreResult<Employee> {
    const T: &str = "employees";
    let role = match get::<String>(row, T, "role")?.as_str() {
        "manager" => EmployeeRole::Manager,
        "staff" => EmployeeRole::Staff,
        other => return Err(corrupt(T, format!("unknown role {other}"))),
    };
    Ok(Employee {
        id: EmployeeId::new(get::<String>(row, T, "id")?).map_err(|e| corrupt(T, e))?,
        franchise_id: FranchiseId::new(get::<String>(row, T, "franchise_id")?)
            .map_err(|e| corrupt(T, e))?,
        name: get(row, T, "name")?,
        role,
    })
}

fn shift_from_row(row: &PgRow) -> StoreResult<Shift> {
    const T: &str = "shifts";
    Ok(Shift {
        employee_id: EmployeeId::new(get::<String>(row, T, "employee_id")?)
            .map_err(|e| corrupt(T, e))?,
        franchise_id: FranchiseId::new(get::<String>(row, T, "franchise_id")?)
            .map_err(|e| corrupt(T, e))?,
        starts_at: get(row, T, "starts_at")?,
        ends_at: get(row, T, "ends_at")?,
    })
}

fn feedback_from_row(row: &PgRow) -> StoreResult<Feedback> {
    const T: &str = "feedback";
    let rating: i16 = get(row, T, "rating")?;
    Ok(Feedback {
        franchise_id: FranchiseId::new(get::<String>(row, T, "franchise_id")?)
            .map_err(|e| corrupt(T, e))?,
        rating: u8::try_from(rating).map_err(|e| corrupt(T, e))?,
        submitted_on: get(row, T, "submitted_on")?,
    })
}

fn agreement_from_row(row: &PgRow) -> StoreResult<Agreement> {
    const T: &str = "agreements";
    Ok(Agreement {
        franchise_id: FranchiseId::new(get::<String>(row, T, "franchise_id")?)
            .map_err(|e| corrupt(T, e))?,
        starts_on: get(row, T, "starts_on")?,
        ends_on: get(row, T, "ends_on")?,
    })
}

fn operating_cost_from_row(row: &PgRow) -> StoreResult<OperatingCost> {
    const T: &str = "operating_costs";
    Ok(OperatingCost {
        franchise_id: FranchiseId::new(get::<String>(row, T, "franchise_id")?)
            .map_err(|e| corrupt(T, e))?,
        amount: Money::from_minor(get(row, T, "amount")?),
        incurred_on: get(row, T, "incurred_on")?,
    })
}
