//! Transactional access to the persisted rows.
//!
//! This module provides the [`AlertStore`], the only path to the alert snapshot,
//! the reminders and the platform setting.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::store::{
    StorageError, StoreLoader, StoreState,
    models::{Alert, AlertRow, Platform, Reminder, ReminderDraft, ReminderStatus, User},
};

/// Durable cache of the current alerts, the reminders and the platform setting.
///
/// # Thread Safety
///
/// The state lives behind a single async mutex which is the write-serialization
/// point of the application. A mutation holds the lock for its whole duration,
/// including the disk write, so concurrent `replace_alerts` and
/// `delete_expired_alerts` calls never interleave.
///
/// # Examples
///
/// ```ignore
/// # async fn example() -> Result<(), StorageError> {
/// let store = AlertStore::open("data/store.json").await?;
/// store.set_platform(Platform::Ps4).await?;
/// assert_eq!(store.get_platform().await, Some(Platform::Ps4));
/// # Ok(())
/// # }
/// ```
pub struct AlertStore {
    /// Last successfully persisted state
    state: Mutex<StoreState>,
    /// Loader writing the state to disk
    loader: StoreLoader,
}

impl AlertStore {
    /// Opens the store document at `path`, creating the sentinel user row if needed.
    ///
    /// A missing document yields an empty store and a corrupted one is moved aside
    /// first, see [`StoreLoader::load`]. The sentinel row is only written to disk
    /// with the next mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the document exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let loader = StoreLoader::new(path);
        let mut state = loader.load().await?;

        if !state
            .users
            .iter()
            .any(|user| user.username == User::SENTINEL_USERNAME)
        {
            state.next_user_id += 1;
            state.users.push(User {
                id: state.next_user_id,
                username: User::SENTINEL_USERNAME.to_owned(),
                platform: None,
            });
            debug!("created sentinel user {}", state.next_user_id);
        }

        info!("opened store {}", loader.path().display());

        Ok(AlertStore {
            state: Mutex::new(state),
            loader,
        })
    }

    /// Runs `operation` as one transaction.
    ///
    /// The operation edits a copy of the state. The copy replaces the current state
    /// only if the operation succeeds and the copy is persisted; otherwise the
    /// current state is left untouched.
    async fn transaction<T, F>(&self, operation: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut StoreState) -> Result<T, StorageError>,
    {
        let mut state = self.state.lock().await;
        let mut draft = state.clone();

        let value = operation(&mut draft)?;
        self.loader.persist(&draft).await?;

        *state = draft;
        Ok(value)
    }

    /// Replaces the whole alert snapshot with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the new snapshot cannot be persisted, in which
    /// case the previous snapshot stays in place.
    pub async fn replace_alerts(&self, snapshot: Vec<Alert>) -> Result<(), StorageError> {
        let count = snapshot.len();
        let result = self
            .transaction(|state| {
                state.alerts.clear();
                for alert in snapshot {
                    state.next_alert_id += 1;
                    state.alerts.push(AlertRow {
                        id: state.next_alert_id,
                        alert,
                    });
                }
                Ok(())
            })
            .await;

        match &result {
            Ok(()) => info!("replaced alert snapshot with {} alerts", count),
            Err(e) => error!("failed to replace alert snapshot with {} alerts: {}", count, e),
        }

        result
    }

    /// Deletes every alert whose expiry is at or before `now`.
    ///
    /// # Returns
    ///
    /// The number of deleted alerts.
    pub async fn delete_expired_alerts(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let result = self
            .transaction(|state| {
                let before = state.alerts.len();
                state.alerts.retain(|row| row.alert.expiry > now);
                Ok(before - state.alerts.len())
            })
            .await;

        match &result {
            Ok(deleted) => debug!("deleted {} alerts expired at {}", deleted, now.to_rfc3339()),
            Err(e) => error!(
                "failed to delete alerts expired at {}: {}",
                now.to_rfc3339(),
                e
            ),
        }

        result
    }

    /// Returns the current alert snapshot in insertion order.
    pub async fn list_alerts(&self) -> Vec<Alert> {
        self.state
            .lock()
            .await
            .alerts
            .iter()
            .map(|row| row.alert.clone())
            .collect()
    }

    /// Returns the scheduled reminders ordered by scheduled time.
    pub async fn list_active_reminders(&self) -> Vec<Reminder> {
        let mut reminders: Vec<Reminder> = self
            .state
            .lock()
            .await
            .reminders
            .iter()
            .filter(|reminder| reminder.status == ReminderStatus::Scheduled)
            .cloned()
            .collect();

        reminders.sort_by_key(|reminder| reminder.scheduled_time);
        reminders
    }

    pub async fn get_reminder(&self, id: u64) -> Option<Reminder> {
        self.state
            .lock()
            .await
            .reminders
            .iter()
            .find(|reminder| reminder.id == id)
            .cloned()
    }

    /// Inserts a new reminder with status `scheduled` for the sentinel user.
    ///
    /// # Returns
    ///
    /// The id of the new reminder.
    pub async fn insert_reminder(&self, draft: ReminderDraft) -> Result<u64, StorageError> {
        let scheduled_time = draft.scheduled_time;
        let result = self
            .transaction(|state| {
                let user_id = Self::sentinel_user(state).id;
                state.next_reminder_id += 1;
                let id = state.next_reminder_id;
                state.reminders.push(Reminder {
                    id,
                    user_id,
                    reminder_type: draft.reminder_type,
                    details: draft.details,
                    scheduled_time: draft.scheduled_time,
                    status: ReminderStatus::Scheduled,
                });
                Ok(id)
            })
            .await;

        match &result {
            Ok(id) => info!(
                "inserted reminder {} scheduled at {}",
                id,
                scheduled_time.to_rfc3339()
            ),
            Err(e) => error!(
                "failed to insert reminder scheduled at {}: {}",
                scheduled_time.to_rfc3339(),
                e
            ),
        }

        result
    }

    /// Marks a reminder as completed.
    ///
    /// Completing an already completed reminder is a no-op, and a cancelled
    /// reminder stays cancelled. Neither case writes to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReminderNotFound`] for an unknown id.
    pub async fn complete_reminder(&self, id: u64) -> Result<(), StorageError> {
        match self.reminder_status(id).await {
            None => {
                error!("cannot complete unknown reminder {}", id);
                return Err(StorageError::ReminderNotFound(id));
            }
            Some(ReminderStatus::Completed) => {
                debug!("reminder {} already completed", id);
                return Ok(());
            }
            Some(ReminderStatus::Cancelled) => {
                warn!("reminder {} was cancelled, not completing it", id);
                return Ok(());
            }
            Some(ReminderStatus::Scheduled) => {}
        }

        let result = self
            .transaction(|state| {
                let reminder = Self::reminder_mut(state, id)?;
                if reminder.status == ReminderStatus::Scheduled {
                    reminder.status = ReminderStatus::Completed;
                }
                Ok(())
            })
            .await;

        match &result {
            Ok(()) => info!("completed reminder {}", id),
            Err(e) => error!("failed to complete reminder {}: {}", id, e),
        }

        result
    }

    /// Marks a scheduled reminder as cancelled.
    ///
    /// # Returns
    ///
    /// `true` if the reminder moved from `scheduled` to `cancelled`, `false` if it
    /// was already in a terminal state.
    pub async fn cancel_reminder(&self, id: u64) -> Result<bool, StorageError> {
        match self.reminder_status(id).await {
            None => return Err(StorageError::ReminderNotFound(id)),
            Some(ReminderStatus::Scheduled) => {}
            Some(_) => return Ok(false),
        }

        let result = self
            .transaction(|state| {
                let reminder = Self::reminder_mut(state, id)?;
                let cancelled = reminder.status == ReminderStatus::Scheduled;
                if cancelled {
                    reminder.status = ReminderStatus::Cancelled;
                }
                Ok(cancelled)
            })
            .await;

        match &result {
            Ok(_) => info!("cancelled reminder {}", id),
            Err(e) => error!("failed to cancel reminder {}: {}", id, e),
        }

        result
    }

    /// Returns the platform of the sentinel user, if one was selected.
    pub async fn get_platform(&self) -> Option<Platform> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|user| user.username == User::SENTINEL_USERNAME)
            .and_then(|user| user.platform)
    }

    /// Sets the platform of the sentinel user, overwriting any previous value.
    pub async fn set_platform(&self, platform: Platform) -> Result<(), StorageError> {
        let result = self
            .transaction(|state| {
                Self::sentinel_user(state).platform = Some(platform);
                Ok(())
            })
            .await;

        match &result {
            Ok(()) => info!("platform set to {}", platform),
            Err(e) => error!("failed to set platform to {}: {}", platform, e),
        }

        result
    }

    async fn reminder_status(&self, id: u64) -> Option<ReminderStatus> {
        self.get_reminder(id).await.map(|reminder| reminder.status)
    }

    fn reminder_mut(state: &mut StoreState, id: u64) -> Result<&mut Reminder, StorageError> {
        state
            .reminders
            .iter_mut()
            .find(|reminder| reminder.id == id)
            .ok_or(StorageError::ReminderNotFound(id))
    }

    /// Returns the sentinel user row, inserting it if the state lacks one.
    fn sentinel_user(state: &mut StoreState) -> &mut User {
        let position = match state
            .users
            .iter()
            .position(|user| user.username == User::SENTINEL_USERNAME)
        {
            Some(position) => position,
            None => {
                state.next_user_id += 1;
                state.users.push(User {
                    id: state.next_user_id,
                    username: User::SENTINEL_USERNAME.to_owned(),
                    platform: None,
                });
                state.users.len() - 1
            }
        };
        &mut state.users[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::ReminderType;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn fetch_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn create_test_alert(mission_type: &str, expiry: DateTime<Utc>) -> Alert {
        Alert::new(mission_type, "Orokin Catalyst", expiry)
    }

    fn create_test_draft(details: &str, scheduled_time: DateTime<Utc>) -> ReminderDraft {
        ReminderDraft {
            reminder_type: ReminderType::Alerts,
            details: details.to_owned(),
            scheduled_time,
        }
    }

    async fn open_test_store(dir: &TempDir) -> AlertStore {
        AlertStore::open(dir.path().join("store.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_single_sentinel_user() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;

        let state = store.state.lock().await;
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.users[0].username, User::SENTINEL_USERNAME);
        assert_eq!(state.users[0].platform, None);
    }

    #[tokio::test]
    async fn test_replace_alerts_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let expiry = fetch_time() + Duration::hours(1);

        store
            .replace_alerts(vec![
                create_test_alert("Survival", expiry),
                create_test_alert("Defense", expiry),
            ])
            .await
            .unwrap();
        store
            .replace_alerts(vec![create_test_alert("Spy", expiry)])
            .await
            .unwrap();

        let alerts = store.list_alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].mission_type, "Spy");
    }

    #[tokio::test]
    async fn test_replace_alerts_failure_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let expiry = fetch_time() + Duration::hours(1);
        store
            .replace_alerts(vec![create_test_alert("Survival", expiry)])
            .await
            .unwrap();

        // Block the temporary file path so the next persist fails
        tokio::fs::create_dir(dir.path().join("store.json.tmp"))
            .await
            .unwrap();
        let result = store
            .replace_alerts(vec![create_test_alert("Defense", expiry)])
            .await;

        assert!(matches!(result, Err(StorageError::Io(_))));
        let alerts = store.list_alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].mission_type, "Survival");
    }

    #[tokio::test]
    async fn test_concurrent_reader_sees_whole_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_test_store(&dir).await);
        let expiry = fetch_time() + Duration::hours(1);
        let old_snapshot: Vec<Alert> = (0..5)
            .map(|i| create_test_alert(&format!("old{}", i), expiry))
            .collect();
        let new_snapshot: Vec<Alert> = (0..8)
            .map(|i| create_test_alert(&format!("new{}", i), expiry))
            .collect();
        store.replace_alerts(old_snapshot.clone()).await.unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let old_snapshot = old_snapshot.clone();
            let new_snapshot = new_snapshot.clone();
            tokio::spawn(async move {
                for i in 0..20 {
                    let snapshot = if i % 2 == 0 {
                        new_snapshot.clone()
                    } else {
                        old_snapshot.clone()
                    };
                    store.replace_alerts(snapshot).await.unwrap();
                }
            })
        };

        for _ in 0..200 {
            let alerts = store.list_alerts().await;
            assert!(alerts == old_snapshot || alerts == new_snapshot);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_expired_alerts_removes_only_expired() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let now = fetch_time();
        store
            .replace_alerts(vec![
                create_test_alert("past", now - Duration::seconds(1)),
                create_test_alert("now", now),
                create_test_alert("future", now + Duration::seconds(1)),
            ])
            .await
            .unwrap();

        let deleted = store.delete_expired_alerts(now).await.unwrap();

        assert_eq!(deleted, 2);
        let alerts = store.list_alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].mission_type, "future");
    }

    #[tokio::test]
    async fn test_delete_expired_alerts_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let now = fetch_time();
        store
            .replace_alerts(vec![create_test_alert("past", now - Duration::minutes(5))])
            .await
            .unwrap();

        assert_eq!(store.delete_expired_alerts(now).await.unwrap(), 1);
        assert_eq!(store.delete_expired_alerts(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_active_reminders_filters_and_orders() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let now = fetch_time();

        let late = store
            .insert_reminder(create_test_draft("late", now + Duration::hours(3)))
            .await
            .unwrap();
        let done = store
            .insert_reminder(create_test_draft("done", now + Duration::hours(2)))
            .await
            .unwrap();
        let early = store
            .insert_reminder(create_test_draft("early", now + Duration::hours(1)))
            .await
            .unwrap();
        store.complete_reminder(done).await.unwrap();

        let ids: Vec<u64> = store
            .list_active_reminders()
            .await
            .iter()
            .map(|reminder| reminder.id)
            .collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[tokio::test]
    async fn test_insert_reminder_belongs_to_sentinel_user() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;

        let id = store
            .insert_reminder(create_test_draft("Nitain", fetch_time()))
            .await
            .unwrap();

        let reminder = store.get_reminder(id).await.unwrap();
        let user_id = store.state.lock().await.users[0].id;
        assert_eq!(reminder.user_id, user_id);
        assert_eq!(reminder.status, ReminderStatus::Scheduled);
        assert_eq!(reminder.details, "Nitain");
    }

    #[tokio::test]
    async fn test_complete_reminder_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let id = store
            .insert_reminder(create_test_draft("Nitain", fetch_time()))
            .await
            .unwrap();

        store.complete_reminder(id).await.unwrap();
        store.complete_reminder(id).await.unwrap();

        assert_eq!(
            store.get_reminder(id).await.unwrap().status,
            ReminderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_complete_unknown_reminder_fails() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;

        let result = store.complete_reminder(42).await;

        assert!(matches!(result, Err(StorageError::ReminderNotFound(42))));
    }

    #[tokio::test]
    async fn test_cancel_reminder_then_complete_keeps_cancelled() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        let id = store
            .insert_reminder(create_test_draft("Nitain", fetch_time()))
            .await
            .unwrap();

        assert!(store.cancel_reminder(id).await.unwrap());
        assert!(!store.cancel_reminder(id).await.unwrap());
        store.complete_reminder(id).await.unwrap();

        assert_eq!(
            store.get_reminder(id).await.unwrap().status,
            ReminderStatus::Cancelled
        );
        assert!(store.list_active_reminders().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_platform_overwrites_singleton_row() {
        let dir = TempDir::new().unwrap();
        let store = open_test_store(&dir).await;
        assert_eq!(store.get_platform().await, None);

        store.set_platform(Platform::Ps4).await.unwrap();
        assert_eq!(store.get_platform().await, Some(Platform::Ps4));

        store.set_platform(Platform::Pc).await.unwrap();
        assert_eq!(store.get_platform().await, Some(Platform::Pc));
        assert_eq!(store.state.lock().await.users.len(), 1);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let expiry = fetch_time() + Duration::hours(1);
        {
            let store = open_test_store(&dir).await;
            store.set_platform(Platform::Switch).await.unwrap();
            store
                .replace_alerts(vec![create_test_alert("Survival", expiry)])
                .await
                .unwrap();
            store
                .insert_reminder(create_test_draft("Nitain", expiry))
                .await
                .unwrap();
        }

        let store = open_test_store(&dir).await;
        assert_eq!(store.get_platform().await, Some(Platform::Switch));
        assert_eq!(store.list_alerts().await.len(), 1);
        assert_eq!(store.list_active_reminders().await.len(), 1);
        assert_eq!(store.state.lock().await.users.len(), 1);
    }

    #[tokio::test]
    async fn test_set_platform_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::open(dir.path().join("missing").join("store.json"))
            .await
            .unwrap();

        let result = store.set_platform(Platform::Ps5).await;

        assert!(result.is_err());
        assert_eq!(store.get_platform().await, None);
    }

    #[tokio::test]
    async fn test_open_unreadable_document_fails() {
        let dir = TempDir::new().unwrap();
        tokio::fs::create_dir(dir.path().join("store.json"))
            .await
            .unwrap();

        let result = AlertStore::open(dir.path().join("store.json")).await;

        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[tokio::test]
    async fn test_corrupted_document_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = open_test_store(&dir).await;
            store
                .insert_reminder(create_test_draft("keep me", fetch_time()))
                .await
                .unwrap();
        }

        // An unknown status makes the whole document unreadable
        let document = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(document.contains("\"scheduled\""));
        tokio::fs::write(&path, document.replace("\"scheduled\"", "\"missed\""))
            .await
            .unwrap();

        let store = open_test_store(&dir).await;
        assert!(store.list_active_reminders().await.is_empty());
        store.set_platform(Platform::Pc).await.unwrap();

        let corrupt = tokio::fs::read_to_string(dir.path().join("store.json.corrupt"))
            .await
            .unwrap();
        assert!(corrupt.contains("keep me"));
        assert!(corrupt.contains("\"missed\""));
        assert_eq!(open_test_store(&dir).await.get_platform().await, Some(Platform::Pc));
    }
}
