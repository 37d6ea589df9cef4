//! Operator dashboard state.
//!
//! Every write is two-phase: the remote call is issued first, and only once it
//! succeeds is the matching pure [`StoreList`] transformation applied to the
//! mirror. A failed call leaves the mirror exactly as it was.

pub mod list;

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::store::{StoreError, StoreFields, StoreRecord, StoreRepository};
use crate::util::time::unix_millis;

pub use list::StoreList;

/// Proof that the operator answered the delete confirmation
#[derive(Debug)]
pub struct Confirmed(());

impl Confirmed {
    /// Only an explicit "yes" confirms
    pub fn from_answer(answer: &str) -> Option<Self> {
        answer.eq_ignore_ascii_case("yes").then_some(Confirmed(()))
    }
}

/// Update stamp that is never behind the previous one
pub fn next_update_stamp(previous: Option<i64>, now: i64) -> i64 {
    match previous {
        Some(previous) => now.max(previous + 1),
        None => now,
    }
}

pub struct Dashboard {
    list: Mutex<StoreList>,
    stale: AtomicBool,
    clock: fn() -> i64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::with_clock(unix_millis)
    }

    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            list: Mutex::new(StoreList::default()),
            stale: AtomicBool::new(true),
            clock,
        }
    }

    pub fn snapshot(&self) -> StoreList {
        self.list.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<StoreRecord> {
        self.list.lock().get(id).cloned()
    }

    /// Whether the mirror must be refetched before it is shown
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Forget every mirrored record
    pub fn clear(&self) {
        self.list.lock().clear();
        self.mark_stale();
    }

    /// Replace the mirror with the full remote listing
    pub async fn refresh<R: StoreRepository>(&self, repo: &R) -> Result<(), StoreError> {
        let records = repo.list().await.inspect_err(|e| {
            warn!(error = %e, "Failed to list stores");
        })?;
        info!(count = records.len(), "Loaded stores");
        self.list.lock().replace_all(records);
        self.stale.store(false, Ordering::Release);
        Ok(())
    }

    /// Create a record and put it at the top of the mirror
    pub async fn create<R: StoreRepository>(
        &self,
        repo: &R,
        fields: StoreFields,
    ) -> Result<StoreRecord, StoreError> {
        let now = (self.clock)();
        let id = repo.create(&fields, now).await.inspect_err(|e| {
            warn!(name = %fields.name, error = %e, "Failed to create store");
        })?;

        let record = StoreRecord {
            id,
            fields,
            created_at: now,
            updated_at: now,
        };
        info!(id = %record.id, name = %record.fields.name, "Created store");
        self.list.lock().prepend(record.clone());
        Ok(record)
    }

    /// Overwrite every field of `id` and patch the mirror in place
    pub async fn update<R: StoreRepository>(
        &self,
        repo: &R,
        id: &str,
        fields: StoreFields,
    ) -> Result<i64, StoreError> {
        let previous = self.list.lock().get(id).map(|record| record.updated_at);
        let updated_at = next_update_stamp(previous, (self.clock)());

        repo.update(id, &fields, updated_at)
            .await
            .inspect_err(|e| {
                warn!(id, error = %e, "Failed to update store");
            })?;

        info!(id, "Updated store");
        self.list.lock().patch(id, fields, updated_at);
        Ok(updated_at)
    }

    /// Hard delete, only after the operator confirmed
    pub async fn delete<R: StoreRepository>(
        &self,
        repo: &R,
        id: &str,
        _confirmed: Confirmed,
    ) -> Result<(), StoreError> {
        repo.delete(id).await.inspect_err(|e| {
            warn!(id, error = %e, "Failed to delete store");
        })?;

        info!(id, "Deleted store");
        self.list.lock().remove(id);
        Ok(())
    }
}
