use std::sync::{Arc, Mutex};

use anyhow::Context;
use time::{Date, OffsetDateTime};
use tracing::{error, instrument};

use crate::remote::{MealRow, RemoteStore};
use crate::session::Role;

use super::dto::{ClickOutcome, DayUpdate, EditTarget, MealCounts};
use super::store::SelectionStore;
use super::toggle;

fn utc_today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Calendar ordering for one signed-in account: turns clicks into toggle
/// decisions, keeps the confirmed selections, and persists batches to the
/// remote meals table. The store is committed only after the whole batch
/// succeeds, so a failed write leaves the last confirmed state rendered.
pub struct CalendarOrders {
    remote: Arc<dyn RemoteStore>,
    email: String,
    role: Role,
    store: Mutex<SelectionStore>,
    today: fn() -> Date,
}

impl CalendarOrders {
    pub fn new(remote: Arc<dyn RemoteStore>, email: impl Into<String>, role: Role) -> Self {
        Self {
            remote,
            email: email.into(),
            role,
            store: Mutex::new(SelectionStore::default()),
            today: utc_today,
        }
    }

    /// Fixed "today" for deterministic tests.
    #[cfg(test)]
    pub fn with_today(mut self, today: fn() -> Date) -> Self {
        self.today = today;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn counts(&self, date: Date) -> MealCounts {
        self.store.lock().expect("store lock poisoned").get(date)
    }

    pub fn is_pending(&self, date: Date) -> bool {
        self.store
            .lock()
            .expect("store lock poisoned")
            .is_pending(date)
    }

    pub fn snapshot(&self) -> std::collections::BTreeMap<Date, MealCounts> {
        self.store.lock().expect("store lock poisoned").snapshot()
    }

    /// Fetch this account's rows and replace the local selections.
    #[instrument(skip(self), fields(email = %self.email))]
    pub async fn load(&self) -> anyhow::Result<()> {
        let rows = self
            .remote
            .select_meals_by_email(&self.email)
            .await
            .context("fetch meals")?;
        let entries: Vec<DayUpdate> = rows
            .into_iter()
            .map(|r| DayUpdate {
                date: r.meal_date,
                counts: MealCounts::new(r.veg_quantity.max(0) as u32, r.meat_quantity.max(0) as u32),
            })
            .collect();
        self.store
            .lock()
            .expect("store lock poisoned")
            .replace(entries);
        Ok(())
    }

    /// A click on one calendar day. Locked, closed, and in-flight dates are
    /// no-ops. Individuals advance the cycle (for the whole week when
    /// `weekly` is set); group-order managers get a quantity form instead.
    #[instrument(skip(self), fields(email = %self.email))]
    pub async fn day_click(&self, date: Date, weekly: bool) -> anyhow::Result<ClickOutcome> {
        let today = (self.today)();
        if !toggle::is_editable(date, today) {
            return Ok(ClickOutcome::Ignored);
        }

        let current = {
            let store = self.store.lock().expect("store lock poisoned");
            if store.is_pending(date) {
                return Ok(ClickOutcome::Ignored);
            }
            store.get(date)
        };

        if self.role == Role::GroupOrder {
            let target = if weekly {
                EditTarget::WeekBatch(date)
            } else {
                EditTarget::SingleDay(date)
            };
            return Ok(ClickOutcome::QuantityForm { target, current });
        }

        let next = toggle::next_cycle(current);
        let updates: Vec<DayUpdate> = if weekly {
            toggle::editable_week_days(date, today)
                .into_iter()
                .map(|d| DayUpdate {
                    date: d,
                    counts: next,
                })
                .collect()
        } else {
            vec![DayUpdate {
                date,
                counts: next,
            }]
        };

        self.save(&updates).await?;
        Ok(ClickOutcome::Saved)
    }

    /// The per-week "+" button: applies one fill to every editable weekday
    /// of the week containing `date`, chosen from the week's current
    /// content. Group-order managers get a quantity form for the week.
    #[instrument(skip(self), fields(email = %self.email))]
    pub async fn week_click(&self, date: Date) -> anyhow::Result<ClickOutcome> {
        let today = (self.today)();
        let days = toggle::editable_week_days(date, today);
        if days.is_empty() {
            return Ok(ClickOutcome::Ignored);
        }

        if self.role == Role::GroupOrder {
            let sunday = toggle::week_days(date)[0];
            return Ok(ClickOutcome::QuantityForm {
                target: EditTarget::WeekBatch(sunday),
                current: MealCounts::ZERO,
            });
        }

        let fill = {
            let store = self.store.lock().expect("store lock poisoned");
            let states: Vec<MealCounts> = days.iter().map(|d| store.get(*d)).collect();
            toggle::classify_week_fill(&states)
        };

        let updates: Vec<DayUpdate> = days
            .into_iter()
            .map(|d| DayUpdate {
                date: d,
                counts: fill,
            })
            .collect();
        self.save(&updates).await?;
        Ok(ClickOutcome::Saved)
    }

    /// Quantity-form submission (group-order managers, or anyone given an
    /// explicit target). Locked and closed dates are dropped from the batch.
    #[instrument(skip(self), fields(email = %self.email))]
    pub async fn submit_quantities(
        &self,
        target: EditTarget,
        counts: MealCounts,
    ) -> anyhow::Result<()> {
        let today = (self.today)();
        let dates: Vec<Date> = match target {
            EditTarget::SingleDay(date) if toggle::is_editable(date, today) => vec![date],
            EditTarget::SingleDay(_) => Vec::new(),
            EditTarget::WeekBatch(date) => toggle::editable_week_days(date, today),
        };
        let updates: Vec<DayUpdate> = dates
            .into_iter()
            .map(|d| DayUpdate {
                date: d,
                counts,
            })
            .collect();
        self.save(&updates).await
    }

    /// Persist a batch: zero entries become deletes, the rest upserts, both
    /// issued concurrently. The local store commits only on full success;
    /// pending flags are cleared either way.
    async fn save(&self, updates: &[DayUpdate]) -> anyhow::Result<()> {
        // Drop dates that already have a write in flight.
        let updates: Vec<DayUpdate> = {
            let mut store = self.store.lock().expect("store lock poisoned");
            let free: Vec<DayUpdate> = updates
                .iter()
                .copied()
                .filter(|u| !store.is_pending(u.date))
                .collect();
            let dates: Vec<Date> = free.iter().map(|u| u.date).collect();
            store.mark_pending(&dates);
            free
        };
        if updates.is_empty() {
            return Ok(());
        }
        let dates: Vec<Date> = updates.iter().map(|u| u.date).collect();

        let to_delete: Vec<Date> = updates
            .iter()
            .filter(|u| u.counts.is_zero())
            .map(|u| u.date)
            .collect();
        let to_upsert: Vec<MealRow> = updates
            .iter()
            .filter(|u| !u.counts.is_zero())
            .map(|u| MealRow {
                user_email: self.email.clone(),
                meal_date: u.date,
                veg_quantity: u.counts.veg as i32,
                meat_quantity: u.counts.meat as i32,
            })
            .collect();

        let result = tokio::try_join!(
            self.remote.delete_meals(&self.email, &to_delete),
            self.remote.upsert_meals(&to_upsert),
        );

        let mut store = self.store.lock().expect("store lock poisoned");
        store.clear_pending(&dates);
        match result {
            Ok(_) => {
                store.apply_local(&updates);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, email = %self.email, "meal save failed");
                Err(e).context("save meals")
            }
        }
    }
}
