//! Access token verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::util::time::unix_secs;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a Supabase access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Email (if available)
    #[serde(default)]
    pub email: Option<String>,
    /// Role
    #[serde(default)]
    pub role: Option<String>,
}

/// Verify an HS256 token against the project secret and extract its claims
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, TokenError> {
    verify_token_at(token, secret, unix_secs())
}

/// Verification with an explicit clock, in Unix seconds
pub fn verify_token_at(token: &str, secret: &str, now: u64) -> Result<TokenClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Malformed)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());

    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;
    mac.verify_slice(&provided_signature)
        .map_err(|_| TokenError::BadSignature)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

    if claims.exp < now {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Token verification errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed access token")]
    Malformed,

    #[error("Access token signature mismatch")]
    BadSignature,

    #[error("Access token expired")]
    Expired,
}

/// Sign claims with HS256, the way the auth provider does
#[cfg(test)]
pub(crate) fn sign_token(claims: &TokenClaims, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", header, payload).as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}.{}", header, payload, signature)
}
