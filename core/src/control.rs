// noskem-core/src/control.rs

//! Signals a handler returns, the result of a whole run, and handler phases.

/// What a handler tells the engine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  /// Run the remaining handlers of this step, then the following steps.
  Continue,
  /// End the run now. Nothing else in this step or later steps executes.
  Halt,
}

/// How a run finished when no handler returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// Every non-skipped step ran.
  Completed,
  /// A handler returned [`Flow::Halt`].
  Halted,
}

impl Outcome {
  pub fn is_completed(self) -> bool {
    matches!(self, Outcome::Completed)
  }
}

/// The three handler slots of a step, executed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}
