//! Supabase REST API client (PostgREST)

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;

/// Query parameters in PostgREST filter form, e.g. `("id", "eq.42")`
pub type Query<'a> = [(&'a str, String)];

/// Supabase client for table operations.
///
/// Every request carries the project anon key as `apikey`. The bearer token
/// defaults to the anon key and is swapped for an operator's access token
/// with [`SupabaseClient::with_bearer`], so row level security decides what
/// each caller may write.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bearer: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            bearer: config.supabase_anon_key.clone(),
        }
    }

    /// Same client, authenticated as the holder of `access_token`
    pub fn with_bearer(&self, access_token: &str) -> Self {
        Self {
            bearer: access_token.to_string(),
            ..self.clone()
        }
    }

    /// Project base URL (shared with the auth API)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Project anon key
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Get the REST API URL for a table
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
            .header("Content-Type", "application/json")
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, SupabaseError> {
        let response = self
            .authorize(self.client.get(self.rest_url(table)).query(query))
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Make an authenticated GET request expecting at most a single row
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Option<T>, SupabaseError> {
        let rows: Vec<T> = self.get(table, query).await?;
        Ok(rows.into_iter().next())
    }

    /// Make an authenticated POST request (insert), returning the stored row
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let response = self
            .authorize(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;

        // PostgREST returns an array, get first element
        let results: Vec<R> = response.json().await.map_err(SupabaseError::Parse)?;
        results
            .into_iter()
            .next()
            .ok_or(SupabaseError::NoRowReturned)
    }

    /// Make an authenticated PATCH request (update), returning the rows touched
    pub async fn update<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
        data: &T,
    ) -> Result<Vec<R>, SupabaseError> {
        let response = self
            .authorize(self.client.patch(self.rest_url(table)).query(query))
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, table: &str, query: &Query<'_>) -> Result<(), SupabaseError> {
        let response = self
            .authorize(self.client.delete(self.rest_url(table)).query(query))
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, SupabaseError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[source] reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,
}
