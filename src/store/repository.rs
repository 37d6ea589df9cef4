//! Store repository access: one remote round-trip per operation

use std::future::Future;

use super::records::{StoreFields, StoreRecord};
use super::supabase::SupabaseError;

/// Pass-through access to the `stores` collection.
///
/// Implementations never cache; the dashboard keeps its own mirror.
pub trait StoreRepository: Send + Sync {
    /// Fetch every record, in whatever order the backend returns them
    fn list(&self) -> impl Future<Output = Result<Vec<StoreRecord>, StoreError>> + Send;

    /// Fetch one record; absence is `Ok(None)`
    fn get(&self, id: &str)
        -> impl Future<Output = Result<Option<StoreRecord>, StoreError>> + Send;

    /// Insert a record stamped with `now` and return its generated identifier
    fn create(
        &self,
        fields: &StoreFields,
        now: i64,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Overwrite every field of `id` and set its update timestamp
    fn update(
        &self,
        id: &str,
        fields: &StoreFields,
        updated_at: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Hard delete
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Repository errors, shown verbatim to the operator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Request(e) => StoreError::Network(e.to_string()),
            SupabaseError::Api { status, body } if status == 401 || status == 403 => {
                StoreError::PermissionDenied(body)
            }
            SupabaseError::Api { status, body } => StoreError::Api { status, body },
            SupabaseError::Parse(e) => StoreError::Parse(e.to_string()),
            SupabaseError::NoRowReturned => {
                StoreError::Parse("insert returned no row".to_string())
            }
        }
    }
}
