// noskem-core/src/lib.rs

//! Step pipelines for Noskem server actions.
//!
//! Every write the marketplace performs has the same shape: check the
//! submitted input, make one call against the hosted store, turn a failure
//! into a message the user can read, then drop cached pages the write made
//! stale. This crate runs those shapes as named steps over a shared context:
//!  - Ordered, named steps with `before` / `on` / `after` handler phases.
//!  - Async handlers that continue or halt the run.
//!  - Optional steps and per-step skip conditions.
//!  - Structural edits (insert, remove, toggle optional) before registration.
//!  - A registry that dispatches a context to the pipeline registered for its type.

pub mod control;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod shared;
pub mod step;

pub use crate::control::{Flow, Outcome, Phase};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::{Handler, Pipeline};
pub use crate::registry::Registry;
pub use crate::shared::Shared;
pub use crate::step::{SkipCondition, StepDef, StepSpec};
