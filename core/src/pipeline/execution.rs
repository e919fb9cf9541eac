// noskem-core/src/pipeline/execution.rs

//! `Pipeline::run`: walks the steps in order and executes their handlers.

use super::Pipeline;
use crate::control::{Flow, Outcome, Phase};
use crate::error::FlowError;
use crate::shared::Shared;
use tracing::{event, info_span, Instrument, Level};

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx`.
  ///
  /// The first handler error is returned as-is and nothing after it runs;
  /// there is no retry and no compensation. A required step with no
  /// handlers at all fails with [`FlowError::HandlerMissing`].
  pub async fn run(&self, ctx: Shared<T>) -> Result<Outcome, E> {
    event!(Level::DEBUG, pipeline = %self.name, steps = self.steps.len(), "Pipeline run starting.");

    for (index, step) in self.steps.iter().enumerate() {
      let span = info_span!("step", pipeline = %self.name, step = %step.name, index);

      if let Some(skip) = &step.skip_if {
        if skip(&ctx) {
          event!(parent: &span, Level::DEBUG, "Step skipped by condition.");
          continue;
        }
      }

      let registered: usize = Phase::ALL.iter().map(|p| self.handler_count(*p, &step.name)).sum();
      if registered == 0 {
        if step.optional {
          event!(parent: &span, Level::DEBUG, "Optional step has no handlers.");
          continue;
        }
        event!(parent: &span, Level::ERROR, "Required step has no handlers.");
        return Err(E::from(FlowError::HandlerMissing {
          step: step.name.clone(),
        }));
      }

      if let Some(outcome) = self.run_step(&step.name, &ctx).instrument(span).await? {
        return Ok(outcome);
      }
    }

    event!(Level::DEBUG, pipeline = %self.name, "Pipeline run completed.");
    Ok(Outcome::Completed)
  }

  /// Runs one step's phases. `Some(Halted)` means a handler stopped the run.
  async fn run_step(&self, step: &str, ctx: &Shared<T>) -> Result<Option<Outcome>, E> {
    for phase in Phase::ALL {
      let Some(handlers) = self.handlers.get(&(phase, step.to_string())) else {
        continue;
      };
      for handler in handlers {
        match handler(ctx.clone()).await {
          Ok(Flow::Continue) => {}
          Ok(Flow::Halt) => {
            event!(Level::INFO, phase = phase.as_str(), "Run halted by handler.");
            return Ok(Some(Outcome::Halted));
          }
          Err(e) => {
            event!(Level::WARN, phase = phase.as_str(), error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(None)
  }
}
