//! Shared in-memory fakes for the remote store and auth provider.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::Date;
use tokio::sync::Notify;

use crate::auth::{AuthClient, ProviderSession};
use crate::remote::{MealRow, RemoteStore, RoleRecord};
use crate::session::Role;

/// Remote store over in-memory maps, honoring the same upsert/delete
/// semantics as the Postgres tables. Failure and gating knobs let tests
/// exercise error and ordering paths.
#[derive(Default)]
pub struct MemoryRemote {
    pub roles: Mutex<BTreeMap<String, RoleRecord>>,
    pub meals: Mutex<BTreeMap<(String, Date), (i32, i32)>>,
    pub insert_role_calls: AtomicUsize,
    /// All meal writes fail while set.
    pub fail_writes: AtomicBool,
    /// Role lookups block until notified while set.
    pub role_gate: Mutex<Option<Arc<Notify>>>,
    /// Meal writes block until notified while set.
    pub write_gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryRemote {
    pub fn with_role(email: &str, role: Role, name: Option<&str>) -> Self {
        let remote = Self::default();
        remote.roles.lock().unwrap().insert(
            email.to_string(),
            RoleRecord {
                user_email: email.to_string(),
                role: role.as_str().to_string(),
                name: name.map(str::to_string),
            },
        );
        remote
    }

    pub fn meal(&self, email: &str, date: Date) -> Option<(i32, i32)> {
        self.meals
            .lock()
            .unwrap()
            .get(&(email.to_string(), date))
            .copied()
    }

    pub fn gate_roles(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.role_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.write_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn select_role_by_email(&self, email: &str) -> anyhow::Result<Option<RoleRecord>> {
        let gate = self.role_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.roles.lock().unwrap().get(email).cloned())
    }

    async fn insert_role(&self, email: &str, role: Role, name: &str) -> anyhow::Result<()> {
        self.insert_role_calls.fetch_add(1, Ordering::SeqCst);
        self.roles.lock().unwrap().insert(
            email.to_string(),
            RoleRecord {
                user_email: email.to_string(),
                role: role.as_str().to_string(),
                name: Some(name.to_string()),
            },
        );
        Ok(())
    }

    async fn update_role_name(&self, email: &str, name: &str) -> anyhow::Result<()> {
        if let Some(record) = self.roles.lock().unwrap().get_mut(email) {
            record.name = Some(name.to_string());
        }
        Ok(())
    }

    async fn update_role(&self, email: &str, role: Role) -> anyhow::Result<()> {
        if let Some(record) = self.roles.lock().unwrap().get_mut(email) {
            record.role = role.as_str().to_string();
        }
        Ok(())
    }

    async fn select_roles(&self) -> anyhow::Result<Vec<RoleRecord>> {
        Ok(self.roles.lock().unwrap().values().cloned().collect())
    }

    async fn select_meals_by_email(&self, email: &str) -> anyhow::Result<Vec<MealRow>> {
        Ok(self
            .meals
            .lock()
            .unwrap()
            .iter()
            .filter(|((e, _), _)| e == email)
            .map(|((e, d), (veg, meat))| MealRow {
                user_email: e.clone(),
                meal_date: *d,
                veg_quantity: *veg,
                meat_quantity: *meat,
            })
            .collect())
    }

    async fn select_all_meals(&self) -> anyhow::Result<Vec<MealRow>> {
        Ok(self
            .meals
            .lock()
            .unwrap()
            .iter()
            .map(|((e, d), (veg, meat))| MealRow {
                user_email: e.clone(),
                meal_date: *d,
                veg_quantity: *veg,
                meat_quantity: *meat,
            })
            .collect())
    }

    async fn select_meals_by_date(&self, date: Date) -> anyhow::Result<Vec<MealRow>> {
        Ok(self
            .meals
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, d), _)| *d == date)
            .map(|((e, d), (veg, meat))| MealRow {
                user_email: e.clone(),
                meal_date: *d,
                veg_quantity: *veg,
                meat_quantity: *meat,
            })
            .collect())
    }

    async fn upsert_meals(&self, rows: &[MealRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("injected upsert failure");
        }
        let mut meals = self.meals.lock().unwrap();
        for row in rows {
            meals.insert(
                (row.user_email.clone(), row.meal_date),
                (row.veg_quantity, row.meat_quantity),
            );
        }
        Ok(())
    }

    async fn delete_meals(&self, email: &str, dates: &[Date]) -> anyhow::Result<()> {
        if dates.is_empty() {
            return Ok(());
        }
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("injected delete failure");
        }
        let mut meals = self.meals.lock().unwrap();
        for date in dates {
            meals.remove(&(email.to_string(), *date));
        }
        Ok(())
    }
}

/// Auth provider that records calls.
#[derive(Default)]
pub struct RecordingAuth {
    pub session: Mutex<Option<ProviderSession>>,
    pub sign_out_calls: AtomicUsize,
    pub oauth_calls: AtomicUsize,
    pub sign_in_calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AuthClient for RecordingAuth {
    async fn sign_in_with_google(&self) -> anyhow::Result<()> {
        self.oauth_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> anyhow::Result<()> {
        self.sign_in_calls
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        Ok(())
    }

    async fn current_session(&self) -> anyhow::Result<Option<ProviderSession>> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
