// noskem-core/src/registry.rs

//! `Registry<E>`: one pipeline per context type, dispatched by `TypeId`.
//!
//! Pipelines registered here may use any handler error `PE` that converts
//! into the registry's application error `E`.

use crate::control::Outcome;
use crate::error::FlowError;
use crate::pipeline::Pipeline;
use crate::shared::Shared;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedPipeline<E>: Send + Sync
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, E>;
}

struct Entry<T, PE, E>
where
  T: 'static + Send + Sync,
  PE: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<T, PE>,
  _errors: PhantomData<fn() -> E>,
}

#[async_trait]
impl<T, PE, E> ErasedPipeline<E> for Entry<T, PE, E>
where
  T: 'static + Send + Sync,
  PE: std::error::Error + From<FlowError> + Send + Sync + 'static,
  E: std::error::Error + From<PE> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, E> {
    let ctx = ctx.downcast::<Shared<T>>().map_err(|_| {
      E::from(FlowError::TypeMismatch {
        at: self.pipeline.name().to_string(),
        expected: std::any::type_name::<Shared<T>>().to_string(),
      })
    })?;
    self.pipeline.run(*ctx).await.map_err(E::from)
  }
}

pub struct Registry<E = FlowError>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipelines: RwLock<HashMap<TypeId, Arc<dyn ErasedPipeline<E>>>>,
}

impl<E> Registry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      pipelines: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for context type `T`, replacing any earlier one.
  pub fn register<T, PE>(&self, pipeline: Pipeline<T, PE>)
  where
    T: 'static + Send + Sync,
    PE: std::error::Error + From<FlowError> + Send + Sync + 'static,
    E: From<PE>,
  {
    event!(Level::DEBUG, pipeline = %pipeline.name(), steps = ?pipeline.step_names(), "Registering pipeline.");
    let entry: Arc<dyn ErasedPipeline<E>> = Arc::new(Entry::<T, PE, E> {
      pipeline,
      _errors: PhantomData,
    });
    if self.pipelines.write().insert(TypeId::of::<T>(), entry).is_some() {
      event!(Level::WARN, context_type = %std::any::type_name::<T>(), "Replaced an existing pipeline.");
    }
  }

  pub fn contains<T: 'static>(&self) -> bool {
    self.pipelines.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.pipelines.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.pipelines.read().is_empty()
  }

  /// Runs the pipeline registered for `T` against `ctx`.
  pub async fn run<T>(&self, ctx: Shared<T>) -> Result<Outcome, E>
  where
    T: 'static + Send + Sync,
  {
    let entry = self.pipelines.read().get(&TypeId::of::<T>()).cloned();
    let Some(entry) = entry else {
      let context_type = std::any::type_name::<T>().to_string();
      event!(Level::ERROR, %context_type, "No pipeline registered.");
      return Err(E::from(FlowError::NotRegistered { context_type }));
    };
    entry.run_erased(Box::new(ctx)).await
  }
}

impl<E> Default for Registry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
