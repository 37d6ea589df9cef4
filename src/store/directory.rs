//! Store directory backed by the Supabase `stores` table

use tracing::debug;

use super::records::{InsertedRow, NewStore, StoreFields, StoreRecord, StoreUpdate};
use super::repository::{StoreError, StoreRepository};
use super::supabase::{SupabaseClient, SupabaseError};

/// PostgreSQL `invalid_text_representation`, raised when an id filter does
/// not parse as the column's type
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Store directory operations
#[derive(Clone)]
pub struct StoreDirectory {
    client: SupabaseClient,
    table: String,
}

impl StoreDirectory {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Directory acting with an operator's access token
    pub fn as_operator(&self, access_token: &str) -> Self {
        Self {
            client: self.client.with_bearer(access_token),
            table: self.table.clone(),
        }
    }
}

fn by_id(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

/// An id that cannot name any row, e.g. text against a bigint column
fn is_unparsable_id(err: &SupabaseError) -> bool {
    let SupabaseError::Api { status: 400, body } = err else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("code")?.as_str().map(str::to_string))
        .is_some_and(|code| code == INVALID_TEXT_REPRESENTATION)
}

impl StoreRepository for StoreDirectory {
    async fn list(&self) -> Result<Vec<StoreRecord>, StoreError> {
        let records: Vec<StoreRecord> = self
            .client
            .get(&self.table, &[("select", "*".to_string())])
            .await?;
        debug!(count = records.len(), "Listed stores");
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<StoreRecord>, StoreError> {
        match self.client.get_one(&self.table, &by_id(id)).await {
            Err(e) if is_unparsable_id(&e) => {
                debug!(id, "Id does not parse for the id column");
                Ok(None)
            }
            result => Ok(result?),
        }
    }

    async fn create(&self, fields: &StoreFields, now: i64) -> Result<String, StoreError> {
        let row: InsertedRow = self
            .client
            .insert(&self.table, &NewStore::new(fields, now))
            .await?;
        Ok(row.id.into())
    }

    async fn update(
        &self,
        id: &str,
        fields: &StoreFields,
        updated_at: i64,
    ) -> Result<(), StoreError> {
        let touched: Vec<InsertedRow> = match self
            .client
            .update(&self.table, &by_id(id), &StoreUpdate { fields, updated_at })
            .await
        {
            Err(e) if is_unparsable_id(&e) => Vec::new(),
            result => result?,
        };
        if touched.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.client.delete(&self.table, &by_id(id)).await?;
        Ok(())
    }
}
