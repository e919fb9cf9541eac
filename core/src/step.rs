// noskem-core/src/step.rs

use crate::shared::Shared;
use std::sync::Arc;

/// Predicate evaluated before a step; `true` skips every handler of the step.
pub type SkipCondition<T> = Arc<dyn Fn(&Shared<T>) -> bool + Send + Sync + 'static>;

/// Declarative input to [`crate::Pipeline::new`].
pub struct StepSpec<T: 'static + Send + Sync> {
  pub name: &'static str,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> StepSpec<T> {
  pub fn required(name: &'static str) -> Self {
    Self {
      name,
      optional: false,
      skip_if: None,
    }
  }

  /// A step that may have no handlers; the run just moves past it.
  pub fn optional(name: &'static str) -> Self {
    Self {
      name,
      optional: true,
      skip_if: None,
    }
  }

  pub fn skip_when(mut self, cond: impl Fn(&Shared<T>) -> bool + Send + Sync + 'static) -> Self {
    self.skip_if = Some(Arc::new(cond));
    self
  }
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> From<StepSpec<T>> for StepDef<T> {
  fn from(spec: StepSpec<T>) -> Self {
    Self {
      name: spec.name.to_string(),
      optional: spec.optional,
      skip_if: spec.skip_if,
    }
  }
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("has_skip_condition", &self.skip_if.is_some())
      .finish()
  }
}
