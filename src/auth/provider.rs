//! Email/password sign-in against the Supabase auth API

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::SupabaseClient;

/// Tokens handed out by the provider for a successful sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// External authentication provider
pub trait AuthProvider: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ProviderSession, AuthError>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Supabase auth (GoTrue) client sharing the project's HTTP client and keys
#[derive(Clone)]
pub struct SupabaseAuth {
    supabase: SupabaseClient,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

impl SupabaseAuth {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase.base_url(), path)
    }
}

impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        let response = self
            .supabase
            .http()
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.supabase.anon_key())
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::Provider(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = provider_message(&body);
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            Err(AuthError::InvalidCredentials(message))
        } else {
            warn!(status = status.as_u16(), %message, "Auth provider rejected sign-in");
            Err(AuthError::Provider(message))
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .supabase
            .http()
            .post(self.auth_url("logout"))
            .header("apikey", self.supabase.anon_key())
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(provider_message(&body)));
        }
        Ok(())
    }
}

/// Pull the human-readable message out of a provider error body
fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

/// Authentication errors, shown verbatim on the login form
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Provider(String),

    #[error("Authentication failed: {0}")]
    Token(#[from] super::token::TokenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(provider_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_provider_message_reads_msg_field() {
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(provider_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_provider_message_falls_back_to_body() {
        assert_eq!(provider_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn test_session_parses_token_response() {
        let body = r#"{"access_token":"tok","token_type":"bearer","expires_in":3600,"refresh_token":"ref","user":{"id":"u1"}}"#;
        let session: ProviderSession = serde_json::from_str(body).unwrap();
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.expires_in, Some(3600));
    }
}
