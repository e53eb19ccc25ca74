//! Infrastructure layer: record store, write pipeline, purchase order
//! processing and configuration.

pub mod config;
pub mod purchase_orders;
pub mod store;
pub mod write_path;

pub use config::AppConfig;
pub use purchase_orders::{
    PurchaseOrderError, PurchaseOrderProcessor, PurchaseOrderReceipt, TransactionCause,
};
pub use store::{
    Database, InMemoryDatabase, PostgresDatabase, ReferenceData, StoreError, UnitOfWork,
};
pub use write_path::{BeforeWrite, RecordWriter, WriteContext, WriteError};
