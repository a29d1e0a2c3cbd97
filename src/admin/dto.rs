use serde::Serialize;

use crate::remote::RoleRecord;
use crate::session::Role;

/// Per-date totals across all accounts, for the admin calendar badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DayTotals {
    pub veg_total: u32,
    pub meat_total: u32,
    pub grand_total: u32,
}

/// One line of the per-day detail listing: who ordered what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub name: String,
    pub email: String,
    pub veg: u32,
    pub meat: u32,
}

/// One account in the role-management table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub email: String,
    pub role: Role,
    pub name: Option<String>,
}

impl From<RoleRecord> for RosterEntry {
    fn from(record: RoleRecord) -> Self {
        Self {
            email: record.user_email,
            role: Role::parse(&record.role),
            name: record.name,
        }
    }
}
