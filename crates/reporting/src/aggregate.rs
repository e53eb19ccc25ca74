//! Shared grouping and ranking helpers.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use franchiseops_core::{DomainResult, FranchiseId, Money};
use franchiseops_sales::Order;

/// Order revenue per franchise for orders whose date passes `filter`.
///
/// Every franchise in `franchises` gets an entry, zero when it had no orders.
/// Orders for any other franchise id are ignored (inner join on franchises).
/// Fails with `InvariantViolation` if a franchise's revenue overflows.
pub(crate) fn revenue_by_franchise<'a>(
    franchises: impl IntoIterator<Item = &'a FranchiseId>,
    orders: &[Order],
    filter: impl Fn(NaiveDate) -> bool,
) -> DomainResult<BTreeMap<FranchiseId, Money>> {
    let mut revenue: BTreeMap<FranchiseId, Money> = franchises
        .into_iter()
        .map(|id| (id.clone(), Money::ZERO))
        .collect();

    for order in orders.iter().filter(|o| filter(o.ordered_on)) {
        if let Some(entry) = revenue.get_mut(&order.franchise_id) {
            *entry = entry.checked_add(order.total)?;
        }
    }
    Ok(revenue)
}

/// `RANK()` over keys already sorted best-first: ties share a rank and the
/// following rank is skipped (1, 2, 2, 4).
pub(crate) fn competition_ranks<K: PartialEq>(sorted_keys: &[K]) -> Vec<u32> {
    let mut ranks: Vec<u32> = Vec::with_capacity(sorted_keys.len());
    for (idx, key) in sorted_keys.iter().enumerate() {
        let rank = if idx > 0 && *key == sorted_keys[idx - 1] {
            ranks[idx - 1]
        } else {
            idx as u32 + 1
        };
        ranks.push(rank);
    }
    ranks
}

/// `numerator / denominator`, or `None` for a zero denominator.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use franchiseops_core::DomainError;
    use franchiseops_sales::OrderId;

    fn order(franchise: &str, total: i64) -> Order {
        Order::new(
            OrderId::generate(),
            FranchiseId::new(franchise).unwrap(),
            Money::from_minor(total),
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn revenue_ignores_orders_of_unknown_franchises() {
        let known = FranchiseId::new("FR-1").unwrap();
        let orders = vec![order("FR-1", 500), order("FR-GHOST", 900)];

        let revenue = revenue_by_franchise([&known], &orders, |_| true).unwrap();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[&known], Money::from_minor(500));
    }

    #[test]
    fn revenue_overflow_is_an_error() {
        let known = FranchiseId::new("FR-1").unwrap();
        let half = i64::MAX / 2 + 1;
        let orders = vec![order("FR-1", half), order("FR-1", half)];

        let err = revenue_by_franchise([&known], &orders, |_| true).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn ties_share_rank_and_skip_next() {
        assert_eq!(competition_ranks(&[9, 7, 7, 3]), vec![1, 2, 2, 4]);
        assert_eq!(competition_ranks(&[5, 5, 5]), vec![1, 1, 1]);
        assert!(competition_ranks::<i32>(&[]).is_empty());
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(3.0, 2.0), Some(1.5));
        assert_eq!(ratio(3.0, 0.0), None);
    }
}
