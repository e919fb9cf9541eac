// tests/registry_tests.rs
mod common;

use common::*;
use noskem_core::{Flow, FlowError, Outcome, Pipeline, Registry, Shared, StepSpec};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ListingContext {
  title: String,
  created: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct OfferContext {
  amount: u32,
  stored: bool,
}

#[tokio::test]
async fn registry_dispatches_by_context_type() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut listing = Pipeline::<ListingContext, TestError>::new([StepSpec::required("create")]);
  listing.on("create", |ctx: Shared<ListingContext>| async move {
    ctx.update(|c| c.created = !c.title.is_empty());
    Ok::<_, TestError>(Flow::Continue)
  });
  registry.register(listing);

  let mut offer = Pipeline::<OfferContext, TestError>::new([StepSpec::required("store")]);
  offer.on("store", |ctx: Shared<OfferContext>| async move {
    ctx.update(|c| c.stored = c.amount > 0);
    Ok::<_, TestError>(Flow::Continue)
  });
  registry.register(offer);

  assert_eq!(registry.len(), 2);
  assert!(registry.contains::<ListingContext>());

  let listing_ctx = Shared::new(ListingContext {
    title: "Walnut desk".to_string(),
    ..Default::default()
  });
  assert_eq!(registry.run(listing_ctx.clone()).await.unwrap(), Outcome::Completed);
  assert!(listing_ctx.read().created);

  let offer_ctx = Shared::new(OfferContext {
    amount: 15_000,
    ..Default::default()
  });
  assert_eq!(registry.run(offer_ctx.clone()).await.unwrap(), Outcome::Completed);
  assert!(offer_ctx.read().stored);
}

#[tokio::test]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  #[derive(Debug, Default)]
  struct OrphanContext;

  let result = registry.run(Shared::new(OrphanContext)).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("NotRegistered"));
      assert!(s.contains("OrphanContext"));
    }
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn pipeline_error_type_converts_into_registry_error_type() {
  setup_tracing();
  // Registry surfaces TestError while the pipeline's handlers speak FlowError.
  let registry = Registry::<TestError>::new();
  let mut p = Pipeline::<ListingContext, FlowError>::new([StepSpec::required("create")]);
  p.on("create", |_ctx: Shared<ListingContext>| async move {
    Err::<Flow, FlowError>(FlowError::Internal("procedure raised".to_string()))
  });
  registry.register(p);

  let err = registry.run(Shared::new(ListingContext::default())).await.unwrap_err();

  assert!(matches!(err, TestError::Flow(ref s) if s.contains("procedure raised")));
}

#[tokio::test]
async fn registering_twice_replaces_the_pipeline() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut first = Pipeline::<OfferContext, TestError>::new([StepSpec::required("store")]);
  first.on("store", |_ctx: Shared<OfferContext>| async move { Ok::<_, TestError>(Flow::Halt) });
  registry.register(first);

  let mut second = Pipeline::<OfferContext, TestError>::new([StepSpec::required("store")]);
  second.on("store", |_ctx: Shared<OfferContext>| async move { Ok::<_, TestError>(Flow::Continue) });
  registry.register(second);

  assert_eq!(registry.len(), 1);
  let outcome = registry.run(Shared::new(OfferContext::default())).await.unwrap();
  assert_eq!(outcome, Outcome::Completed);
}
