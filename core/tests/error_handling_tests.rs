// tests/error_handling_tests.rs
mod common;
use common::*;
use noskem_core::{Flow, FlowError, Outcome, Pipeline, Shared, StepSpec};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn missing_handler_names_the_step() {
  setup_tracing();
  let pipeline = Pipeline::<ActionContext, TestError>::new([StepSpec::required("call_procedure")]);
  let result = pipeline.run(Shared::new(ActionContext::default())).await;
  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("call_procedure"));
    }
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
}

// A pipeline whose error type is FlowError itself.
#[tokio::test]
#[serial]
async fn pipeline_with_flow_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<ActionContext, FlowError>::new([StepSpec::required("task")]);
  pipeline.on("task", |ctx: Shared<ActionContext>| async move {
    ctx.update(|c| c.remote_calls = 1);
    Ok::<Flow, FlowError>(Flow::Continue)
  });

  let ctx = Shared::new(ActionContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), Outcome::Completed);
  assert_eq!(ctx.read().remote_calls, 1);

  let mut failing = Pipeline::<ActionContext, FlowError>::new([StepSpec::required("fail_task")]);
  failing.on("fail_task", |_ctx: Shared<ActionContext>| async move {
    Err::<Flow, anyhow::Error>(anyhow::anyhow!("row violates check constraint"))
  });
  match failing.run(Shared::new(ActionContext::default())).await {
    Err(FlowError::Handler { source }) => assert!(source.to_string().contains("check constraint")),
    other => panic!("Expected FlowError::Handler, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn validation_error_from_first_step_prevents_remote_call() {
  setup_tracing();
  let mut pipeline = Pipeline::<ActionContext, TestError>::new([
    StepSpec::required("validate"),
    StepSpec::required("remote_write"),
  ]);
  pipeline.on("validate", |ctx: Shared<ActionContext>| async move {
    if ctx.with(|c| c.input.trim().is_empty()) {
      return Err(TestError::Validation("Title is required".to_string()));
    }
    Ok(Flow::Continue)
  });
  pipeline.push_handler(
    noskem_core::Phase::On,
    "remote_write",
    remote_call_handler("remote_write"),
  );

  let ctx = Shared::new(ActionContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Validation("Title is required".to_string()));
  assert_eq!(ctx.read().remote_calls, 0);
}
