// noskem-core/src/pipeline/hooks.rs

//! Handler registration for the `before`, `on` and `after` phases.
//!
//! A handler may return any error type that converts into the pipeline's
//! `E`, so steps can be written against narrower errors (or plain
//! [`FlowError`]) and still compose.

use super::{Handler, Pipeline};
use crate::control::{Flow, Phase};
use crate::error::FlowError;
use crate::shared::Shared;
use std::future::Future;
use tracing::{event, Level};

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn before<F, Fut, HErr>(&mut self, step: &str, handler: F)
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    self.attach(Phase::Before, step, handler);
  }

  pub fn on<F, Fut, HErr>(&mut self, step: &str, handler: F)
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    self.attach(Phase::On, step, handler);
  }

  pub fn after<F, Fut, HErr>(&mut self, step: &str, handler: F)
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    self.attach(Phase::After, step, handler);
  }

  /// Registers an already boxed handler, e.g. one shared between pipelines.
  pub fn push_handler(&mut self, phase: Phase, step: &str, handler: Handler<T, E>) {
    self.position(step);
    self.handlers.entry((phase, step.to_string())).or_default().push(handler);
  }

  fn attach<F, Fut, HErr>(&mut self, phase: Phase, step: &str, handler: F)
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    let boxed: Handler<T, E> = Box::new(move |ctx| {
      let fut = handler(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.push_handler(phase, step, boxed);
    event!(Level::TRACE, pipeline = %self.name, step, phase = phase.as_str(), "Handler attached.");
  }
}
