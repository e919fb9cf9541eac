// noskem/src/web/auth.rs

//! Session extractors. The bearer token is a hosted-auth JWT.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::auth_service::verify_session_token;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  /// Email the auth service put in the token, if any.
  pub email: Option<String>,
}

/// The caller, when a valid session is present. Pages that also serve guests use this.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
  let token = bearer_token(req).ok_or_else(|| {
    warn!(path = %req.path(), "Request without a session token.");
    AppError::Auth("Please sign in to continue".to_string())
  })?;
  let claims = verify_session_token(token, &state.config.auth_jwt_secret, &state.config.auth_jwt_audience)?;
  Ok(AuthenticatedUser {
    user_id: claims.sub,
    email: claims.email,
  })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    if bearer_token(req).is_none() {
      return ready(Ok(MaybeUser(None)));
    }
    // A token that is present but invalid is still an error, not a guest.
    ready(authenticate(req).map(|u| MaybeUser(Some(u))))
  }
}
