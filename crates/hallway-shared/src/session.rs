//! Signed, expiring admin session tokens.
//!
//! A successful admin login yields a bearer token: an RFC-3339 expiry
//! timestamp signed with the server's in-memory Ed25519 key.  Each admin
//! request verifies the signature and the expiry.  The key is generated at
//! startup and never persisted, so restarting the server revokes all
//! outstanding sessions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;
use thiserror::Error;

/// Reasons a presented session token is not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error("invalid session token signature")]
    BadSignature,

    #[error("session token expired")]
    Expired,
}

/// The server's session-signing keypair.
pub struct SessionKey {
    signing: SigningKey,
}

impl SessionKey {
    /// Generate a fresh keypair.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Issue a token valid for `ttl` from now.
    ///
    /// Token layout: `base64url(expiry_rfc3339) "." base64url(signature)`.
    pub fn issue(&self, ttl: Duration) -> String {
        self.issue_until(Utc::now() + ttl)
    }

    /// Issue a token with an explicit expiry (used by tests).
    pub fn issue_until(&self, expires_at: DateTime<Utc>) -> String {
        let payload = expires_at.to_rfc3339();
        let signature = self.signing.sign(payload.as_bytes());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature.to_bytes()),
        )
    }

    /// Verify a token and return its expiry on success.
    pub fn verify(&self, token: &str) -> Result<DateTime<Utc>, SessionError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(SessionError::Malformed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SessionError::Malformed)?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| SessionError::Malformed)?;

        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| SessionError::Malformed)?;
        self.signing
            .verifying_key()
            .verify(&payload, &signature)
            .map_err(|_| SessionError::BadSignature)?;

        let payload_str = std::str::from_utf8(&payload).map_err(|_| SessionError::Malformed)?;
        let expires_at = DateTime::parse_from_rfc3339(payload_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| SessionError::Malformed)?;

        if Utc::now() > expires_at {
            return Err(SessionError::Expired);
        }
        Ok(expires_at)
    }
}
