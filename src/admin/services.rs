use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use time::Date;
use tracing::instrument;

use crate::remote::{MealRow, RemoteStore};
use crate::session::Role;

use super::dto::{DayTotals, OrderDetail, RosterEntry};

/// Fold all accounts' rows into per-date totals.
pub fn aggregate(rows: &[MealRow]) -> BTreeMap<Date, DayTotals> {
    let mut totals: BTreeMap<Date, DayTotals> = BTreeMap::new();
    for row in rows {
        let veg = row.veg_quantity.max(0) as u32;
        let meat = row.meat_quantity.max(0) as u32;
        let entry = totals.entry(row.meal_date).or_default();
        entry.veg_total += veg;
        entry.meat_total += meat;
        entry.grand_total += veg + meat;
    }
    totals
}

/// Join one day's rows against the roster by case-insensitive email. An
/// order with no roster entry falls back to showing the raw email.
pub fn day_details(rows: &[MealRow], roster: &[RosterEntry]) -> Vec<OrderDetail> {
    rows.iter()
        .map(|row| {
            let name = roster
                .iter()
                .find(|entry| entry.email.eq_ignore_ascii_case(&row.user_email))
                .and_then(|entry| entry.name.clone())
                .unwrap_or_else(|| row.user_email.clone());
            OrderDetail {
                name,
                email: row.user_email.clone(),
                veg: row.veg_quantity.max(0) as u32,
                meat: row.meat_quantity.max(0) as u32,
            }
        })
        .collect()
}

/// Admin view over all orders and accounts: aggregated calendar totals,
/// per-day detail listings, and role management.
pub struct AdminBoard {
    remote: Arc<dyn RemoteStore>,
    roster: Mutex<Vec<RosterEntry>>,
}

impl AdminBoard {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            roster: Mutex::new(Vec::new()),
        }
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.roster.lock().expect("roster lock poisoned").clone()
    }

    /// Fetch every meal row and the full roster, returning the aggregated
    /// per-date totals for the calendar.
    #[instrument(skip(self))]
    pub async fn load(&self) -> anyhow::Result<BTreeMap<Date, DayTotals>> {
        let (rows, roles) = tokio::try_join!(
            self.remote.select_all_meals(),
            self.remote.select_roles(),
        )
        .context("fetch admin data")?;

        *self.roster.lock().expect("roster lock poisoned") =
            roles.into_iter().map(RosterEntry::from).collect();
        Ok(aggregate(&rows))
    }

    /// Detail listing for one date, joined against the cached roster.
    #[instrument(skip(self))]
    pub async fn order_details(&self, date: Date) -> anyhow::Result<Vec<OrderDetail>> {
        let rows = self
            .remote
            .select_meals_by_date(date)
            .await
            .context("fetch day orders")?;
        let roster = self.roster.lock().expect("roster lock poisoned");
        Ok(day_details(&rows, &roster))
    }

    /// Change an account's role; the cached roster follows on success.
    #[instrument(skip(self))]
    pub async fn set_role(&self, email: &str, role: Role) -> anyhow::Result<()> {
        self.remote
            .update_role(email, role)
            .await
            .context("update role")?;
        let mut roster = self.roster.lock().expect("roster lock poisoned");
        if let Some(entry) = roster.iter_mut().find(|e| e.email == email) {
            entry.role = role;
        }
        Ok(())
    }
}
