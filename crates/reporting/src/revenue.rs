//! Revenue-based reports.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use franchiseops_core::{DomainResult, FranchiseId, Money};

use crate::aggregate::{competition_ranks, ratio, revenue_by_franchise};
use crate::dataset::{OwnerId, ReportingDataset};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueGrowth {
    pub franchise_id: FranchiseId,
    pub year: i32,
    pub revenue: Money,
    pub previous_revenue: Money,
    /// `None` when the previous year had no revenue.
    pub growth_pct: Option<f64>,
}

/// Year-over-year revenue growth for every franchise, fastest growing first.
pub fn revenue_growth(ds: &ReportingDataset, year: i32) -> DomainResult<Vec<RevenueGrowth>> {
    let ids = ds.franchises.iter().map(|f| &f.id);
    let current = revenue_by_franchise(ids.clone(), &ds.orders, |d| d.year() == year)?;
    let previous = revenue_by_franchise(ids, &ds.orders, |d| d.year() == year - 1)?;

    let mut rows: Vec<RevenueGrowth> = current
        .into_iter()
        .map(|(franchise_id, revenue)| {
            let previous_revenue = previous.get(&franchise_id).copied().unwrap_or_default();
            let growth_pct = ratio(
                (revenue.minor() as f64 - previous_revenue.minor() as f64) * 100.0,
                previous_revenue.minor() as f64,
            );
            RevenueGrowth {
                franchise_id,
                year,
                revenue,
                previous_revenue,
                growth_pct,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        let a_key = a.growth_pct.unwrap_or(f64::NEG_INFINITY);
        let b_key = b.growth_pct.unwrap_or(f64::NEG_INFINITY);
        b_key
            .total_cmp(&a_key)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitPerSeat {
    pub franchise_id: FranchiseId,
    pub revenue: Money,
    pub operating_costs: Money,
    pub profit: Money,
    pub seating_capacity: u32,
    /// Profit per seat in major currency units; `None` with no seats.
    pub profit_per_seat: Option<f64>,
}

/// Profit for `year` normalised by seating capacity, most profitable per seat first.
pub fn profit_per_seat(ds: &ReportingDataset, year: i32) -> DomainResult<Vec<ProfitPerSeat>> {
    let revenue = revenue_by_franchise(
        ds.franchises.iter().map(|f| &f.id),
        &ds.orders,
        |d| d.year() == year,
    )?;

    let mut costs: BTreeMap<&FranchiseId, Money> = BTreeMap::new();
    for cost in ds
        .operating_costs
        .iter()
        .filter(|c| c.incurred_on.year() == year)
    {
        let entry = costs.entry(&cost.franchise_id).or_default();
        *entry = entry.checked_add(cost.amount)?;
    }

    let mut rows = ds
        .franchises
        .iter()
        .map(|f| -> DomainResult<ProfitPerSeat> {
            let revenue = revenue.get(&f.id).copied().unwrap_or_default();
            let operating_costs = costs.get(&f.id).copied().unwrap_or_default();
            let profit = revenue.checked_sub(operating_costs)?;
            Ok(ProfitPerSeat {
                franchise_id: f.id.clone(),
                revenue,
                operating_costs,
                profit,
                seating_capacity: f.seating_capacity,
                profit_per_seat: ratio(profit.as_major_f64(), f64::from(f.seating_capacity)),
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;

    rows.sort_by(|a, b| {
        let a_key = a.profit_per_seat.unwrap_or(f64::NEG_INFINITY);
        let b_key = b.profit_per_seat.unwrap_or(f64::NEG_INFINITY);
        b_key
            .total_cmp(&a_key)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerRevenue {
    pub rank: u32,
    pub owner_id: OwnerId,
    pub owner_name: String,
    pub franchises: usize,
    pub revenue: Money,
}

/// All-time revenue summed across each owner's franchises, ranked.
pub fn owner_revenue_ranking(ds: &ReportingDataset) -> DomainResult<Vec<OwnerRevenue>> {
    let revenue = revenue_by_franchise(ds.franchises.iter().map(|f| &f.id), &ds.orders, |_| true)?;

    let mut per_owner: BTreeMap<&OwnerId, (usize, Money)> = BTreeMap::new();
    for f in &ds.franchises {
        let entry = per_owner.entry(&f.owner_id).or_default();
        entry.0 += 1;
        entry.1 = entry.1.checked_add(revenue.get(&f.id).copied().unwrap_or_default())?;
    }

    let mut rows: Vec<OwnerRevenue> = per_owner
        .into_iter()
        .map(|(owner_id, (franchises, revenue))| OwnerRevenue {
            rank: 0,
            owner_id: owner_id.clone(),
            owner_name: ds
                .owner(owner_id)
                .map(|o| o.name.clone())
                .unwrap_or_default(),
            franchises,
            revenue,
        })
        .collect();

    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.owner_id.cmp(&b.owner_id)));
    let keys: Vec<Money> = rows.iter().map(|r| r.revenue).collect();
    for (row, rank) in rows.iter_mut().zip(competition_ranks(&keys)) {
        row.rank = rank;
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueShare {
    pub franchise_id: FranchiseId,
    pub revenue: Money,
    /// Percentage of all franchises' revenue (0 when there is none).
    pub share_pct: f64,
}

/// Each franchise's share of total revenue, largest first.
pub fn revenue_share(ds: &ReportingDataset) -> DomainResult<Vec<RevenueShare>> {
    let revenue = revenue_by_franchise(ds.franchises.iter().map(|f| &f.id), &ds.orders, |_| true)?;
    let total = Money::checked_sum(revenue.values().copied())?.minor();

    let mut rows: Vec<RevenueShare> = revenue
        .into_iter()
        .map(|(franchise_id, revenue)| RevenueShare {
            franchise_id,
            revenue,
            share_pct: ratio(revenue.minor() as f64 * 100.0, total as f64).unwrap_or(0.0),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePerEmployee {
    pub franchise_id: FranchiseId,
    pub revenue: Money,
    pub employees: usize,
    /// Rounded down to the minor unit; `None` with no employees.
    pub revenue_per_employee: Option<Money>,
}

/// All-time revenue divided by headcount, highest first.
pub fn revenue_per_employee(ds: &ReportingDataset) -> DomainResult<Vec<RevenuePerEmployee>> {
    let revenue = revenue_by_franchise(ds.franchises.iter().map(|f| &f.id), &ds.orders, |_| true)?;

    let mut headcount: BTreeMap<&FranchiseId, usize> = BTreeMap::new();
    for e in &ds.employees {
        *headcount.entry(&e.franchise_id).or_default() += 1;
    }

    let mut rows: Vec<RevenuePerEmployee> = revenue
        .into_iter()
        .map(|(franchise_id, revenue)| {
            let employees = headcount.get(&franchise_id).copied().unwrap_or(0);
            let revenue_per_employee = (employees > 0)
                .then(|| Money::from_minor(revenue.minor() / employees as i64));
            RevenuePerEmployee {
                franchise_id,
                revenue,
                employees,
                revenue_per_employee,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue_per_employee
            .cmp(&a.revenue_per_employee)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    Ok(rows)
}
