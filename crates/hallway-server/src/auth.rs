//! Admin authentication.
//!
//! Login checks the configured credentials in constant time and issues a
//! signed, expiring session token (see `hallway_shared::session`).  Every
//! other admin endpoint presents the token as a bearer credential.  When no
//! admin password is configured the whole admin API is disabled.

use axum::http::HeaderMap;
use chrono::Duration;
use subtle::ConstantTimeEq;

use crate::api::AppState;
use crate::error::ApiError;

/// Check the supplied credentials against the configured ones.
///
/// Comparison is constant-time to avoid leaking prefix matches through
/// timing.
pub fn check_credentials(state: &AppState, username: &str, password: &str) -> Result<(), ApiError> {
    let Some(ref expected_password) = state.config.admin_password else {
        return Err(ApiError::Unauthorized(
            "Admin API is disabled (no ADMIN_PASSWORD configured)".into(),
        ));
    };

    let user_ok = constant_time_eq(username, &state.config.admin_username);
    let pass_ok = constant_time_eq(password, expected_password);

    if !(user_ok && pass_ok) {
        return Err(ApiError::Unauthorized("Invalid admin credentials".into()));
    }
    Ok(())
}

/// Issue a session token with the configured TTL.
pub fn issue_session(state: &AppState) -> (String, chrono::DateTime<chrono::Utc>) {
    let ttl = Duration::seconds(state.config.session_ttl_secs as i64);
    let expires_at = chrono::Utc::now() + ttl;
    (state.sessions.issue_until(expires_at), expires_at)
}

/// Verify the bearer session token on an admin request.
pub fn require_admin(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    if state.config.admin_password.is_none() {
        return Err(ApiError::Unauthorized(
            "Admin API is disabled (no ADMIN_PASSWORD configured)".into(),
        ));
    }

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    if token.is_empty() {
        return Err(ApiError::Unauthorized(
            "Admin authentication required".into(),
        ));
    }

    state
        .sessions
        .verify(token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    Ok(())
}

fn constant_time_eq(supplied: &str, expected: &str) -> bool {
    let supplied = supplied.as_bytes();
    let expected = expected.as_bytes();
    supplied.len() == expected.len() && supplied.ct_eq(expected).unwrap_u8() == 1
}
