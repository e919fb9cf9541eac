// noskem-core/src/pipeline/definition.rs

//! `Pipeline<T, E>` construction and structural edits.
//!
//! Edits are setup-time operations. Naming a step that does not exist, or
//! adding one twice, is a programming error and panics immediately instead
//! of surfacing on the first request.

use super::Handler;
use crate::control::Phase;
use crate::error::FlowError;
use crate::shared::Shared;
use crate::step::{StepDef, StepSpec};
use std::collections::HashMap;
use std::sync::Arc;

pub struct Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) handlers: HashMap<(Phase, String), Vec<Handler<T, E>>>,
}

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline named after its context type.
  pub fn new(steps: impl IntoIterator<Item = StepSpec<T>>) -> Self {
    let short = std::any::type_name::<T>().rsplit("::").next().unwrap_or("pipeline");
    Self::named(short, steps)
  }

  pub fn named(name: impl Into<String>, steps: impl IntoIterator<Item = StepSpec<T>>) -> Self {
    let mut pipeline = Self {
      name: name.into(),
      steps: Vec::new(),
      handlers: HashMap::new(),
    };
    for spec in steps {
      pipeline.assert_absent(spec.name);
      pipeline.steps.push(spec.into());
    }
    pipeline
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn handler_count(&self, phase: Phase, step: &str) -> usize {
    self
      .handlers
      .get(&(phase, step.to_string()))
      .map_or(0, Vec::len)
  }

  pub(crate) fn position(&self, step: &str) -> usize {
    self
      .steps
      .iter()
      .position(|s| s.name == step)
      .unwrap_or_else(|| panic!("pipeline '{}': step '{}' is not defined", self.name, step))
  }

  fn assert_absent(&self, step: &str) {
    if self.steps.iter().any(|s| s.name == step) {
      panic!("pipeline '{}': step '{}' is already defined", self.name, step);
    }
  }

  pub fn insert_before(&mut self, existing: &str, spec: StepSpec<T>) {
    let idx = self.position(existing);
    self.assert_absent(spec.name);
    self.steps.insert(idx, spec.into());
  }

  pub fn insert_after(&mut self, existing: &str, spec: StepSpec<T>) {
    let idx = self.position(existing);
    self.assert_absent(spec.name);
    self.steps.insert(idx + 1, spec.into());
  }

  /// Removes a step and every handler attached to it. Unknown names are ignored.
  pub fn remove_step(&mut self, step: &str) {
    self.steps.retain(|s| s.name != step);
    self.handlers.retain(|(_, name), _| name != step);
  }

  pub fn set_optional(&mut self, step: &str, optional: bool) {
    let idx = self.position(step);
    self.steps[idx].optional = optional;
  }

  pub fn skip_when(&mut self, step: &str, cond: impl Fn(&Shared<T>) -> bool + Send + Sync + 'static) {
    let idx = self.position(step);
    self.steps[idx].skip_if = Some(Arc::new(cond));
  }
}
