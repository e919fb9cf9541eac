// noskem-core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the engine itself rather than by a step's handler.
///
/// Pipelines are generic over the caller's error type `E`, which must be
/// `From<FlowError>` so these can surface through the same `Result`.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step}")]
  StepNotFound { step: String },

  #[error("Step already defined: {step}")]
  DuplicateStep { step: String },

  #[error("Handler missing for required step: {step}")]
  HandlerMissing { step: String },

  #[error("No pipeline registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context type mismatch at '{at}' (expected {expected})")]
  TypeMismatch { at: String, expected: String },

  #[error("Handler failed. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<FlowError>() {
      Ok(flow_err) => flow_err,
      Err(source) => FlowError::Handler { source },
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
