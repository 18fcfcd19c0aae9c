//! Session management
//!
//! Uses HMAC-signed tokens carried as a bearer token or a cookie.
//! No server-side session storage needed.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::data::User;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// User session data
///
/// Signed, not encrypted: keep it to identifiers only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user` valid for `max_age_secs`
    ///
    /// # Errors
    /// Returns `Config` if the expiry does not fit in a timestamp
    pub fn for_user(user: &User, max_age_secs: i64) -> Result<Self, AppError> {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(max_age_secs)
            .and_then(|max_age| now.checked_add_signed(max_age))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "auth.session_max_age of {} seconds is out of range",
                    max_age_secs
                ))
            })?;

        Ok(Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            created_at: now,
            expires_at,
        })
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

fn sign(payload_b64: &str, secret: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    Ok(mac)
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let signature = sign(&payload_b64, secret)?.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `Unauthorized` if the token is malformed, tampered with or expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    // Constant-time comparison
    sign(payload_b64, secret)?
        .verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use crate::data::{EntityId, Role};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn user() -> User {
        User {
            id: EntityId::new().0,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            bio: None,
            role: Role::Member.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips_session_identity() {
        let user = user();
        let token = create_session_token(&Session::for_user(&user, 60).unwrap(), SECRET).unwrap();

        let session = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = create_session_token(&Session::for_user(&user(), 60).unwrap(), SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = general_purpose::URL_SAFE_NO_PAD.encode(
            br#"{"user_id":"x","username":"mallory","created_at":"2020-01-01T00:00:00Z","expires_at":"2999-01-01T00:00:00Z"}"#,
        );

        let forged = format!("{forged_payload}.{signature}");
        assert!(matches!(
            verify_session_token(&forged, SECRET),
            Err(AppError::Unauthorized)
        ));
        assert!(verify_session_token(&token, &"y".repeat(32)).is_err());
        assert!(verify_session_token("not-a-token", SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_session_token(&Session::for_user(&user(), -1).unwrap(), SECRET).unwrap();
        assert!(matches!(
            verify_session_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn oversized_max_age_is_a_config_error() {
        assert!(matches!(
            Session::for_user(&user(), i64::MAX),
            Err(AppError::Config(message)) if message.contains("session_max_age")
        ));
    }
}
