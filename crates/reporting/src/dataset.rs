//! Committed rows the reports read.
//!
//! The core rule units own orders and inventory; everything else here
//! (franchises, owners, staff, feedback, agreements, costs) is reference data
//! maintained elsewhere and only ever read.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use franchiseops_core::{FranchiseId, Money, string_id};
use franchiseops_inventory::InventoryRecord;
use franchiseops_sales::Order;

string_id!(OwnerId, "OwnerId");
string_id!(EmployeeId, "EmployeeId");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Franchise {
    pub id: FranchiseId,
    pub name: String,
    pub owner_id: OwnerId,
    pub seating_capacity: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    Manager,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub franchise_id: FranchiseId,
    pub name: String,
    pub role: EmployeeRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub employee_id: EmployeeId,
    pub franchise_id: FranchiseId,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

impl Shift {
    /// Length in whole minutes; `None` when the shift ends before it starts.
    pub fn minutes(&self) -> Option<i64> {
        let minutes = (self.ends_at - self.starts_at).num_minutes();
        (minutes >= 0).then_some(minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub franchise_id: FranchiseId,
    /// 1 (worst) to 5 (best).
    pub rating: u8,
    pub submitted_on: NaiveDate,
}

/// Franchise agreement between the brand and a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub franchise_id: FranchiseId,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl Agreement {
    pub fn duration_days(&self) -> i64 {
        (self.ends_on - self.starts_on).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingCost {
    pub franchise_id: FranchiseId,
    pub amount: Money,
    pub incurred_on: NaiveDate,
}

/// Everything the reports need, loaded in one read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingDataset {
    pub owners: Vec<Owner>,
    pub franchises: Vec<Franchise>,
    pub employees: Vec<Employee>,
    pub shifts: Vec<Shift>,
    pub feedback: Vec<Feedback>,
    pub agreements: Vec<Agreement>,
    pub operating_costs: Vec<OperatingCost>,
    pub orders: Vec<Order>,
    pub inventory: Vec<InventoryRecord>,
}

impl ReportingDataset {
    pub fn franchise(&self, id: &FranchiseId) -> Option<&Franchise> {
        self.franchises.iter().find(|f| &f.id == id)
    }

    pub fn owner(&self, id: &OwnerId) -> Option<&Owner> {
        self.owners.iter().find(|o| &o.id == id)
    }
}
