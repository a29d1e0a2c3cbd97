//! Meal ordering engine for a dining-hall calendar: per-day veg/meat
//! selection with the individual toggle cycle and weekly batches, optimistic
//! local state reconciled against a hosted Postgres backend, session sync
//! over the auth provider's event stream with a cache-first fast path, and
//! admin aggregation over all accounts' orders.
//!
//! The hosted backend and auth provider are collaborators behind the
//! [`remote::RemoteStore`] and [`auth::AuthClient`] traits; this crate owns
//! no server, only outbound reads, upserts, and deletes keyed on
//! (account email, date).

pub mod admin;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod orders;
pub mod remote;
pub mod session;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::SyncError;
pub use state::AppState;
