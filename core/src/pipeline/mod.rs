// noskem-core/src/pipeline/mod.rs

//! The `Pipeline<T, E>` type: definition and structural edits, handler
//! registration, and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

use crate::control::Flow;
use crate::shared::Shared;
use std::future::Future;
use std::pin::Pin;

pub use definition::Pipeline;

/// A registered step handler.
///
/// Receives a clone of the run's [`Shared`] context and resolves to the
/// next [`Flow`] or the pipeline's error type.
pub type Handler<T, E> =
  Box<dyn Fn(Shared<T>) -> Pin<Box<dyn Future<Output = Result<Flow, E>> + Send>> + Send + Sync>;
