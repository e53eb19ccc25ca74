use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use franchiseops_core::{
    DomainError, DomainResult, Entity, FranchiseId, InvariantMode, Money, RecordId, string_id,
};

/// Customer order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub RecordId);

impl OrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(RecordId::new())
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

string_id!(
    /// Code a customer enters to redeem a coupon (unique per coupon).
    CouponCode,
    "CouponCode"
);

/// A named discount rule.
///
/// Read-only from the pricing rule's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: CouponCode,
    /// Subtotal must be at least this for the coupon to apply.
    pub min_purchase: Money,
    /// Last day (inclusive) on which the coupon is valid.
    pub expires_on: NaiveDate,
    /// Flat amount taken off the subtotal.
    pub discount: Money,
}

impl Coupon {
    pub fn new(
        code: CouponCode,
        min_purchase: Money,
        expires_on: NaiveDate,
        discount: Money,
    ) -> DomainResult<Self> {
        if min_purchase.is_negative() {
            return Err(DomainError::validation("min_purchase cannot be negative"));
        }
        if discount.is_negative() {
            return Err(DomainError::validation("discount cannot be negative"));
        }
        Ok(Self {
            code,
            min_purchase,
            expires_on,
            discount,
        })
    }

    /// Both conditions must hold; there is no partial discount.
    pub fn applies_to(&self, subtotal: Money, today: NaiveDate) -> bool {
        subtotal >= self.min_purchase && today <= self.expires_on
    }
}

impl Entity for Coupon {
    type Id = CouponCode;
    const KIND: &'static str = "coupon";

    fn id(&self) -> &Self::Id {
        &self.code
    }
}

/// A customer order placed at a franchise.
///
/// `total` is derived: it is recomputed by [`apply_pricing`] on every write and
/// any value supplied by the caller is overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub franchise_id: FranchiseId,
    pub subtotal: Money,
    pub coupon_code: Option<CouponCode>,
    pub total: Money,
    pub ordered_on: NaiveDate,
}

impl Order {
    /// New order with `total` provisionally equal to `subtotal`.
    pub fn new(
        id: OrderId,
        franchise_id: FranchiseId,
        subtotal: Money,
        coupon_code: Option<CouponCode>,
        ordered_on: NaiveDate,
    ) -> Self {
        Self {
            id,
            franchise_id,
            subtotal,
            coupon_code,
            total: subtotal,
            ordered_on,
        }
    }

    /// Amount taken off by pricing (zero when no coupon applied).
    pub fn discount_applied(&self) -> Money {
        Money::from_minor(self.subtotal.minor() - self.total.minor())
    }
}

impl Entity for Order {
    type Id = OrderId;
    const KIND: &'static str = "order";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Total for `subtotal` given the coupon the order references, if any.
pub fn compute_total(
    subtotal: Money,
    coupon: Option<&Coupon>,
    today: NaiveDate,
) -> DomainResult<Money> {
    match coupon {
        Some(c) if c.applies_to(subtotal, today) => subtotal.checked_sub(c.discount),
        _ => Ok(subtotal),
    }
}

/// Pricing rule: set `order.total` from its subtotal and coupon.
///
/// `coupon` is the result of looking up `order.coupon_code`; passing `None`
/// while the order names a code means the lookup missed and the write fails
/// with `NotFound`. On error the order is left untouched.
pub fn apply_pricing(
    order: &mut Order,
    coupon: Option<&Coupon>,
    today: NaiveDate,
    mode: InvariantMode,
) -> DomainResult<()> {
    if mode.is_strict() && order.subtotal.is_negative() {
        return Err(DomainError::validation("subtotal cannot be negative"));
    }

    let coupon = match (&order.coupon_code, coupon) {
        (None, _) => None,
        (Some(code), None) => return Err(DomainError::not_found(Coupon::KIND, code)),
        (Some(code), Some(c)) if &c.code != code => {
            return Err(DomainError::invariant(format!(
                "coupon {} supplied for order referencing {}",
                c.code, code
            )));
        }
        (Some(_), Some(c)) => Some(c),
    };

    let total = compute_total(order.subtotal, coupon, today)?;
    if mode.is_strict() && total.is_negative() {
        return Err(DomainError::invariant(format!(
            "order total cannot be negative (subtotal {}, total {total})",
            order.subtotal
        )));
    }

    order.total = total;
    Ok(())
}
