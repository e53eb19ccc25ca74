//! Sales domain module: customer orders, coupons and the pricing rule.
//!
//! Pure domain logic (no IO, no HTTP, no storage). The infrastructure layer
//! looks up the coupon and calls [`apply_pricing`] before an order is written.

pub mod order;

pub use order::{Coupon, CouponCode, Order, OrderId, apply_pricing, compute_total};
