// noskem/src/services/auth_service.rs

//! Session tokens and role checks.
//!
//! Sign-in happens against the hosted auth service, which issues HS256
//! JWTs. The application only verifies them and looks up the caller's
//! profile when an action is restricted to a role.

use crate::db::{decode_row, RemoteDb, Select, Table};
use crate::errors::AppError;
use crate::models::{Profile, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
  pub sub: Uuid,
  pub aud: String,
  pub exp: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

/// Validates signature, expiry and audience, and returns the claims.
#[instrument(name = "auth_service::verify_session_token", skip_all, err(Display))]
pub fn verify_session_token(token: &str, secret: &str, audience: &str) -> Result<SessionClaims, AppError> {
  let mut validation = Validation::new(Algorithm::HS256);
  validation.set_audience(&[audience]);
  decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
    .map(|data| data.claims)
    .map_err(|e| {
      debug!(error = %e, "Session token rejected.");
      AppError::Auth("Invalid or expired session".to_string())
    })
}

/// Mints a token the way the hosted auth service does. Used by local tooling and tests.
pub fn issue_session_token(user_id: Uuid, secret: &str, audience: &str, ttl: Duration) -> Result<String, AppError> {
  issue_session_token_with_email(user_id, None, secret, audience, ttl)
}

pub fn issue_session_token_with_email(
  user_id: Uuid,
  email: Option<&str>,
  secret: &str,
  audience: &str,
  ttl: Duration,
) -> Result<String, AppError> {
  let now = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map_err(|e| AppError::Internal(e.to_string()))?;
  let claims = SessionClaims {
    sub: user_id,
    aud: audience.to_string(),
    exp: (now + ttl).as_secs() as usize,
    email: email.map(str::to_string),
  };
  encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

pub async fn load_profile(db: &dyn RemoteDb, user_id: Uuid) -> Result<Profile, AppError> {
  let row = db
    .select(&Select::table(Table::Profiles).eq("id", user_id).limit(1))
    .await?
    .first()
    .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
  Ok(decode_row(row)?)
}

/// Loads the caller's profile and fails with `Forbidden` unless its role is in `allowed`.
#[instrument(name = "auth_service::require_role", skip(db), err(Display))]
pub async fn require_role(db: &dyn RemoteDb, user_id: Uuid, allowed: &[Role]) -> Result<Profile, AppError> {
  let profile = load_profile(db, user_id).await?;
  if allowed.contains(&profile.role) {
    Ok(profile)
  } else {
    warn!(%user_id, role = ?profile.role, "Role check failed.");
    Err(AppError::Forbidden("You are not allowed to perform this action".to_string()))
  }
}
