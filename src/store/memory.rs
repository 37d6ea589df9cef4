//! In-memory repository used by tests

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::records::{StoreFields, StoreRecord};
use super::repository::{StoreError, StoreRepository};

#[derive(Default)]
pub struct MemoryStores {
    rows: Mutex<Vec<StoreRecord>>,
    next_id: AtomicU64,
    fail_next: Mutex<Option<StoreError>>,
}

impl MemoryStores {
    /// Make the next call fail with `err`
    pub fn fail_next(&self, err: StoreError) {
        *self.fail_next.lock() = Some(err);
    }

    pub fn rows(&self) -> Vec<StoreRecord> {
        self.rows.lock().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl StoreRepository for MemoryStores {
    async fn list(&self) -> Result<Vec<StoreRecord>, StoreError> {
        self.check()?;
        Ok(self.rows())
    }

    async fn get(&self, id: &str) -> Result<Option<StoreRecord>, StoreError> {
        self.check()?;
        Ok(self.rows.lock().iter().find(|row| row.id == id).cloned())
    }

    async fn create(&self, fields: &StoreFields, now: i64) -> Result<String, StoreError> {
        self.check()?;
        let id = format!("store-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.rows.lock().push(StoreRecord {
            id: id.clone(),
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update(
        &self,
        id: &str,
        fields: &StoreFields,
        updated_at: i64,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        row.fields = fields.clone();
        row.updated_at = updated_at;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.rows.lock().retain(|row| row.id != id);
        Ok(())
    }
}
