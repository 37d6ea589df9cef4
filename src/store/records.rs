//! Store profile records as persisted in the `stores` table

use serde::{Deserialize, Deserializer, Serialize};

/// A store profile row. Keys match the persisted camelCase layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: StoreFields,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: i64,
}

/// Every editable field of a store profile.
///
/// Optional channels are `None` when absent; rows written by other clients
/// may still carry empty strings, which the profile renderer treats as absent.
/// Text columns read `null` as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreFields {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub logo_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub opening_hours: String,
    pub website_url: Option<String>,
    pub whatsapp: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub location_url: String,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub telegram: Option<String>,
    pub google_review_url: Option<String>,
}

impl StoreFields {
    /// Fields with only a name set
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Insert payload: fields plus both timestamps, identifier left to the database
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStore<'a> {
    #[serde(flatten)]
    pub fields: &'a StoreFields,
    pub created_at: i64,
    pub updated_at: i64,
}

impl<'a> NewStore<'a> {
    /// Creation stamps both timestamps with the same instant
    pub fn new(fields: &'a StoreFields, now: i64) -> Self {
        Self {
            fields,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Update payload: full field set plus the refreshed update timestamp.
/// `createdAt` is never part of an update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate<'a> {
    #[serde(flatten)]
    pub fields: &'a StoreFields,
    pub updated_at: i64,
}

/// Row identifier returned from an insert
#[derive(Debug, Clone, Deserialize)]
pub struct InsertedRow {
    pub id: StoreId,
}

/// Identifiers arrive as strings or numbers depending on the column type
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoreId {
    Text(String),
    Number(i64),
}

impl From<StoreId> for String {
    fn from(id: StoreId) -> Self {
        match id {
            StoreId::Text(text) => text,
            StoreId::Number(number) => number.to_string(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StoreId::deserialize(deserializer).map(String::from)
}
