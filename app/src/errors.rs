// noskem/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;
use noskem_core::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  /// A stored procedure or constraint refused the write; the message is the user's to read.
  #[error("Rejected by database: {0}")]
  Remote(String),

  #[error("Payment Provider Error: {0}")]
  Payment(String),

  #[error("Storage Error: {0}")]
  Storage(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Db(DbError),

  /// A page read failed; the message is the fixed one the page shows.
  #[error("Read Failed: {0}")]
  ReadFailed(&'static str),

  #[error("Workflow Error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<DbError> for AppError {
  fn from(err: DbError) -> Self {
    match err {
      DbError::Rejected { message } => AppError::Remote(message),
      other => AppError::Db(other),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Internal(format!("Outbound request failed: {}", err))
  }
}

impl AppError {
  /// Remote rejection with the stock fallback when the store sent no message.
  pub fn remote_or(message: Option<String>, fallback: &str) -> Self {
    match message.filter(|m| !m.trim().is_empty()) {
      Some(m) => AppError::Remote(m),
      None => AppError::Remote(fallback.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Remote(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Payment(_) | AppError::Storage(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_)
      | AppError::Db(_)
      | AppError::ReadFailed(_)
      | AppError::Flow { .. }
      | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let body = match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::Remote(m) => json!({ "error": m }),
      AppError::Payment(m) => json!({"error": "Payment provider error", "detail": m}),
      AppError::Storage(m) => json!({"error": "File upload failed", "detail": m}),
      AppError::Config(_) => json!({"error": "Configuration issue"}),
      AppError::Db(_) => json!({"error": "Database operation failed"}),
      AppError::ReadFailed(m) => json!({ "error": m }),
      AppError::Flow { .. } => json!({"error": "Request processing error"}),
      AppError::Internal(_) => json!({"error": "An internal error occurred"}),
    };
    HttpResponse::build(self.status_code()).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
