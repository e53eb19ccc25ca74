//! Operational reports: feedback, agreements and stock, shifts, staffing, capacity.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use serde::Serialize;

use franchiseops_core::FranchiseId;

use crate::aggregate::{competition_ranks, ratio};
use crate::dataset::{EmployeeRole, ReportingDataset};

/// A franchise needs expansion when its orders per seat exceed this multiple
/// of the cross-franchise average.
pub const EXPANSION_FACTOR: f64 = 1.5;

/// Length of the order window used by [`expansion_candidates`].
pub const EXPANSION_WINDOW_MONTHS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRanking {
    pub rank: u32,
    pub franchise_id: FranchiseId,
    pub franchise_name: String,
    pub responses: usize,
    pub average_rating: f64,
}

/// Franchises ranked by average customer rating. Franchises without feedback
/// are left out, as is feedback for franchise ids that are not known.
pub fn feedback_ranking(ds: &ReportingDataset) -> Vec<FeedbackRanking> {
    let mut totals: BTreeMap<&FranchiseId, (usize, u64)> = BTreeMap::new();
    for fb in &ds.feedback {
        let entry = totals.entry(&fb.franchise_id).or_default();
        entry.0 += 1;
        entry.1 += u64::from(fb.rating);
    }

    let mut rows: Vec<FeedbackRanking> = totals
        .into_iter()
        .filter_map(|(franchise_id, (responses, sum))| {
            let franchise = ds.franchise(franchise_id)?;
            Some(FeedbackRanking {
                rank: 0,
                franchise_id: franchise_id.clone(),
                franchise_name: franchise.name.clone(),
                responses,
                average_rating: sum as f64 / responses as f64,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    let keys: Vec<f64> = rows.iter().map(|r| r.average_rating).collect();
    for (row, rank) in rows.iter_mut().zip(competition_ranks(&keys)) {
        row.rank = rank;
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementInventoryRank {
    pub franchise_id: FranchiseId,
    /// Length of the most recent agreement; `None` without one.
    pub agreement_days: Option<i64>,
    pub units_on_hand: i64,
    pub agreement_rank: u32,
    pub inventory_rank: u32,
}

/// Franchises ranked by agreement length and, independently, by stock on hand.
///
/// Rows are ordered by agreement rank.
pub fn agreement_inventory_ranking(ds: &ReportingDataset) -> Vec<AgreementInventoryRank> {
    let mut rows: Vec<AgreementInventoryRank> = ds
        .franchises
        .iter()
        .map(|f| {
            let agreement_days = ds
                .agreements
                .iter()
                .filter(|a| a.franchise_id == f.id)
                .max_by_key(|a| a.starts_on)
                .map(|a| a.duration_days());
            let units_on_hand = ds
                .inventory
                .iter()
                .filter(|r| r.key.franchise_id == f.id)
                .fold(0_i64, |acc, r| acc.saturating_add(r.quantity_on_hand));
            AgreementInventoryRank {
                franchise_id: f.id.clone(),
                agreement_days,
                units_on_hand,
                agreement_rank: 0,
                inventory_rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.units_on_hand
            .cmp(&a.units_on_hand)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    let keys: Vec<i64> = rows.iter().map(|r| r.units_on_hand).collect();
    for (row, rank) in rows.iter_mut().zip(competition_ranks(&keys)) {
        row.inventory_rank = rank;
    }

    // None sorts below every real duration.
    rows.sort_by(|a, b| {
        b.agreement_days
            .cmp(&a.agreement_days)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    let keys: Vec<Option<i64>> = rows.iter().map(|r| r.agreement_days).collect();
    for (row, rank) in rows.iter_mut().zip(competition_ranks(&keys)) {
        row.agreement_rank = rank;
    }
    rows
}

/// Shift length band.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ShiftBucket {
    /// Under 4 hours.
    Short,
    /// 4 to 8 hours inclusive.
    Standard,
    /// Over 8 hours.
    Long,
}

impl ShiftBucket {
    pub fn for_minutes(minutes: i64) -> Self {
        if minutes < 4 * 60 {
            ShiftBucket::Short
        } else if minutes <= 8 * 60 {
            ShiftBucket::Standard
        } else {
            ShiftBucket::Long
        }
    }
}

/// One line of the shift summary.
///
/// `bucket == None` marks a franchise subtotal; `franchise_id == None` as well
/// marks the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftDurationRow {
    pub franchise_id: Option<FranchiseId>,
    pub bucket: Option<ShiftBucket>,
    pub shifts: usize,
    pub total_hours: f64,
}

/// Shift counts and hours per franchise and length band, with a subtotal per
/// franchise and a grand total last. Shifts ending before they start are ignored.
pub fn shift_duration_summary(ds: &ReportingDataset) -> Vec<ShiftDurationRow> {
    let mut cells: BTreeMap<(&FranchiseId, ShiftBucket), (usize, i64)> = BTreeMap::new();
    for shift in &ds.shifts {
        let Some(minutes) = shift.minutes() else {
            continue;
        };
        let cell = cells
            .entry((&shift.franchise_id, ShiftBucket::for_minutes(minutes)))
            .or_default();
        cell.0 += 1;
        cell.1 += minutes;
    }

    let hours = |minutes: i64| minutes as f64 / 60.0;
    let mut rows = Vec::new();
    let mut current: Option<(&FranchiseId, usize, i64)> = None;
    let (mut grand_shifts, mut grand_minutes) = (0usize, 0i64);

    for ((franchise_id, bucket), (shifts, minutes)) in cells {
        if let Some((prev, sub_shifts, sub_minutes)) = current {
            if prev != franchise_id {
                rows.push(ShiftDurationRow {
                    franchise_id: Some(prev.clone()),
                    bucket: None,
                    shifts: sub_shifts,
                    total_hours: hours(sub_minutes),
                });
                current = None;
            }
        }

        rows.push(ShiftDurationRow {
            franchise_id: Some(franchise_id.clone()),
            bucket: Some(bucket),
            shifts,
            total_hours: hours(minutes),
        });

        let (_, sub_shifts, sub_minutes) = current.get_or_insert((franchise_id, 0, 0));
        *sub_shifts += shifts;
        *sub_minutes += minutes;
        grand_shifts += shifts;
        grand_minutes += minutes;
    }

    if let Some((prev, sub_shifts, sub_minutes)) = current {
        rows.push(ShiftDurationRow {
            franchise_id: Some(prev.clone()),
            bucket: None,
            shifts: sub_shifts,
            total_hours: hours(sub_minutes),
        });
    }
    rows.push(ShiftDurationRow {
        franchise_id: None,
        bucket: None,
        shifts: grand_shifts,
        total_hours: hours(grand_minutes),
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffingRatio {
    pub franchise_id: FranchiseId,
    pub employees: usize,
    pub managers: usize,
    pub seating_capacity: u32,
    pub employees_per_seat: Option<f64>,
    pub managers_per_employee: Option<f64>,
}

/// Headcount relative to seating and the manager share of staff.
pub fn staffing_ratios(ds: &ReportingDataset) -> Vec<StaffingRatio> {
    ds.franchises
        .iter()
        .map(|f| {
            let staff = ds.employees.iter().filter(|e| e.franchise_id == f.id);
            let employees = staff.clone().count();
            let managers = staff.filter(|e| e.role == EmployeeRole::Manager).count();
            StaffingRatio {
                franchise_id: f.id.clone(),
                employees,
                managers,
                seating_capacity: f.seating_capacity,
                employees_per_seat: ratio(employees as f64, f64::from(f.seating_capacity)),
                managers_per_employee: ratio(managers as f64, employees as f64),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionAssessment {
    pub franchise_id: FranchiseId,
    pub recent_orders: usize,
    pub seating_capacity: u32,
    pub orders_per_seat: f64,
    pub needs_expansion: bool,
}

/// Flag franchises whose recent orders per seat exceed
/// [`EXPANSION_FACTOR`] × the average across franchises.
///
/// The window is the [`EXPANSION_WINDOW_MONTHS`] months ending on `as_of`
/// (exclusive start, inclusive end). Franchises without seats are skipped.
pub fn expansion_candidates(ds: &ReportingDataset, as_of: NaiveDate) -> Vec<ExpansionAssessment> {
    let window_start = as_of
        .checked_sub_months(Months::new(EXPANSION_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN);

    let mut rows: Vec<ExpansionAssessment> = ds
        .franchises
        .iter()
        .filter(|f| f.seating_capacity > 0)
        .map(|f| {
            let recent_orders = ds
                .orders
                .iter()
                .filter(|o| o.franchise_id == f.id)
                .filter(|o| o.ordered_on > window_start && o.ordered_on <= as_of)
                .count();
            ExpansionAssessment {
                franchise_id: f.id.clone(),
                recent_orders,
                seating_capacity: f.seating_capacity,
                orders_per_seat: recent_orders as f64 / f64::from(f.seating_capacity),
                needs_expansion: false,
            }
        })
        .collect();

    if rows.is_empty() {
        return rows;
    }
    let average = rows.iter().map(|r| r.orders_per_seat).sum::<f64>() / rows.len() as f64;
    for row in &mut rows {
        row.needs_expansion = row.orders_per_seat > EXPANSION_FACTOR * average;
    }

    rows.sort_by(|a, b| {
        b.orders_per_seat
            .total_cmp(&a.orders_per_seat)
            .then_with(|| a.franchise_id.cmp(&b.franchise_id))
    });
    rows
}
