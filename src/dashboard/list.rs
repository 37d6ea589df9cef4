//! In-memory mirror of the store collection and its pure transformations

use crate::store::{StoreFields, StoreRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreList {
    records: Vec<StoreRecord>,
}

impl StoreList {
    #[cfg(test)]
    pub fn new(records: Vec<StoreRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[StoreRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StoreRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Replace everything with a fresh listing
    pub fn replace_all(&mut self, records: Vec<StoreRecord>) {
        self.records = records;
    }

    /// Newly created records go first
    pub fn prepend(&mut self, record: StoreRecord) {
        self.records.insert(0, record);
    }

    /// Overwrite the fields and update stamp of `id` in place.
    /// Returns false when the record is not mirrored.
    pub fn patch(&mut self, id: &str, fields: StoreFields, updated_at: i64) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.fields = fields;
                record.updated_at = updated_at;
                true
            }
            None => false,
        }
    }

    /// Drop `id`; returns the removed record if it was mirrored
    pub fn remove(&mut self, id: &str) -> Option<StoreRecord> {
        let index = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
