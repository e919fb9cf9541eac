// tests/common/mod.rs
#![allow(dead_code)]

use noskem_core::{Flow, FlowError, Handler, Shared};
use once_cell::sync::Lazy;
use tracing::Level;

/// Stand-in for a server action's context: what was submitted and what ran.
#[derive(Clone, Debug, Default)]
pub struct ActionContext {
  pub input: String,
  pub remote_calls: u32,
  pub trail: Vec<String>,
  pub halt_at: Option<String>,
  pub revalidated: Vec<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("remote rejected: {0}")]
  Remote(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records `label` in the trail and halts if the context asks for it.
pub fn recording_handler(label: &'static str) -> Handler<ActionContext, TestError> {
  Box::new(move |ctx: Shared<ActionContext>| {
    Box::pin(async move {
      let halt = ctx.update(|c| {
        c.trail.push(label.to_string());
        c.halt_at.as_deref() == Some(label)
      });
      tracing::debug!(target: "test_handlers", label, "recorded");
      Ok(if halt { Flow::Halt } else { Flow::Continue })
    })
  })
}

pub fn remote_call_handler(label: &'static str) -> Handler<ActionContext, TestError> {
  Box::new(move |ctx: Shared<ActionContext>| {
    Box::pin(async move {
      tokio::task::yield_now().await;
      ctx.update(|c| {
        c.remote_calls += 1;
        c.trail.push(label.to_string());
      });
      Ok(Flow::Continue)
    })
  })
}

pub fn rejecting_handler(label: &'static str, message: &'static str) -> Handler<ActionContext, TestError> {
  Box::new(move |ctx: Shared<ActionContext>| {
    Box::pin(async move {
      ctx.update(|c| c.trail.push(label.to_string()));
      Err(TestError::Remote(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
