use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use franchiseops_core::{FranchiseId, InvariantMode, Money};
use franchiseops_infra::purchase_orders::PurchaseOrderProcessor;
use franchiseops_infra::store::{Database, InMemoryDatabase};
use franchiseops_infra::write_path::{RecordWriter, WriteContext};
use franchiseops_inventory::{
    InventoryItemId, InventoryRecord, MaterialId, RawMaterial, Shipment, ShipmentId,
};
use franchiseops_purchasing::{PoNumber, ProcessPurchaseOrder};
use franchiseops_sales::{Coupon, CouponCode, Order, OrderId, compute_total};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn ctx() -> WriteContext {
    WriteContext::new(today(), InvariantMode::Strict)
}

fn coupon() -> Coupon {
    Coupon::new(
        CouponCode::new("SAVE20").unwrap(),
        Money::from_minor(15_000),
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        Money::from_minor(2_000),
    )
    .unwrap()
}

/// Store with one coupon and one material holding `quantity` units.
fn seeded(rt: &Runtime, quantity: i64) -> Arc<InMemoryDatabase> {
    let db = Arc::new(InMemoryDatabase::new());
    rt.block_on(async {
        let mut uow = db.begin().await.unwrap();
        uow.insert_coupon(&coupon()).await.unwrap();
        uow.insert_material(
            &RawMaterial::new(MaterialId::new("RM-1").unwrap(), "Flour", quantity).unwrap(),
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();
    });
    db
}

fn order(coupon: Option<&str>) -> Order {
    Order::new(
        OrderId::generate(),
        FranchiseId::new("FR-1").unwrap(),
        Money::from_minor(20_000),
        coupon.map(|c| CouponCode::new(c).unwrap()),
        today(),
    )
}

fn bench_pricing_rule(c: &mut Criterion) {
    let coupon = coupon();
    c.bench_function("compute_total_with_coupon", |b| {
        b.iter(|| {
            compute_total(
                black_box(Money::from_minor(20_000)),
                black_box(Some(&coupon)),
                black_box(today()),
            )
        })
    });
}

fn bench_record_writes(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("record_write");
    group.throughput(Throughput::Elements(1));

    let db = seeded(&rt, i64::MAX / 2);
    let orders = RecordWriter::orders();
    let unhooked = RecordWriter::<Order>::new();
    let inventory = RecordWriter::inventory();
    let shipments = RecordWriter::shipments();

    group.bench_function("order_with_coupon", |b| {
        b.iter(|| {
            rt.block_on(orders.write(db.as_ref(), order(Some("SAVE20")), &ctx()))
                .unwrap()
        })
    });

    group.bench_function("order_without_hooks", |b| {
        b.iter(|| {
            rt.block_on(unhooked.write(db.as_ref(), order(None), &ctx()))
                .unwrap()
        })
    });

    group.bench_function("inventory_record", |b| {
        let mut qoh = 0;
        b.iter(|| {
            qoh = (qoh + 7) % 100;
            let record = InventoryRecord::new(
                InventoryItemId::new("SKU-1").unwrap(),
                FranchiseId::new("FR-1").unwrap(),
                qoh,
                20,
            )
            .unwrap();
            rt.block_on(inventory.write(db.as_ref(), record, &ctx()))
                .unwrap()
        })
    });

    group.bench_function("shipment_with_reservation", |b| {
        b.iter(|| {
            let shipment = Shipment {
                id: ShipmentId::generate(),
                material_id: MaterialId::new("RM-1").unwrap(),
                franchise_id: None,
                quantity: 1,
                shipped_on: today(),
            };
            rt.block_on(shipments.write(db.as_ref(), shipment, &ctx()))
                .unwrap()
        })
    });

    group.finish();
}

fn bench_purchase_orders(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("purchase_order");

    for preloaded in [0usize, 1_000] {
        let db = seeded(&rt, 0);
        let processor = PurchaseOrderProcessor::new(Arc::clone(&db), InvariantMode::Strict);
        let mut seq = 0u64;
        let mut next_request = move || {
            seq += 1;
            ProcessPurchaseOrder {
                po_number: PoNumber::new(format!("PO-{seq}")).unwrap(),
                material_id: MaterialId::new("RM-1").unwrap(),
                quantity: 1,
                ordered_on: today(),
            }
        };
        for _ in 0..preloaded {
            rt.block_on(processor.process(&next_request())).unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("process", preloaded),
            &preloaded,
            |b, _| b.iter(|| rt.block_on(processor.process(&next_request())).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pricing_rule,
    bench_record_writes,
    bench_purchase_orders
);
criterion_main!(benches);
