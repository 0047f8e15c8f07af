//! Alert cache maintenance.
//!
//! Two independent producers write to the alert snapshot of the
//! [`AlertStore`](crate::store::AlertStore):
//!
//! - [`AlertSyncEngine`]: replaces the snapshot with the latest fetch, on demand
//!   and on a polling interval
//! - [`CleanupJob`]: deletes the alerts that expired since the last refresh
//!
//! Both go through the store's transactions, so a sweep never observes half of a
//! replacement.

mod cleanup;
mod sync_engine;

pub use crate::alerts::cleanup::CleanupJob;
pub use crate::alerts::sync_engine::{AlertSyncEngine, RefreshOutcome, SyncEvent};
