//! Franchise reporting: read-only aggregations over committed rows.
//!
//! Each report is a pure function of a [`ReportingDataset`]. Ranks follow SQL
//! `RANK()` semantics (ties share a rank, the next rank is skipped) and ties
//! are listed in franchise/owner id order so output is deterministic.

mod aggregate;
pub mod dataset;
pub mod operations;
pub mod revenue;

pub use dataset::{
    Agreement, Employee, EmployeeId, EmployeeRole, Feedback, Franchise, OperatingCost, Owner,
    OwnerId, ReportingDataset, Shift,
};
pub use operations::{
    AgreementInventoryRank, EXPANSION_FACTOR, EXPANSION_WINDOW_MONTHS, ExpansionAssessment,
    FeedbackRanking, ShiftBucket, ShiftDurationRow, StaffingRatio, agreement_inventory_ranking,
    expansion_candidates, feedback_ranking, shift_duration_summary, staffing_ratios,
};
pub use revenue::{
    OwnerRevenue, ProfitPerSeat, RevenueGrowth, RevenuePerEmployee, RevenueShare,
    owner_revenue_ranking, profit_per_seat, revenue_growth, revenue_per_employee, revenue_share,
};
