// noskem/src/pipelines/mod.rs

//! Server actions, each a `noskem_core` pipeline over its own context type.

use crate::errors::AppError;
use noskem_core::Registry;

pub mod common_steps;
pub mod contexts;
pub mod validation;

pub mod checkout_pipeline;
pub mod dispute_pipeline;
pub mod inspection_pipeline;
pub mod listing_pipeline;
pub mod offer_pipeline;
pub mod order_pipeline;
pub mod webhook_pipeline;

/// Registers every action pipeline. Called once while building `AppState`.
pub fn register_all_pipelines(registry: &Registry<AppError>) {
  tracing::info!("Registering action pipelines...");

  listing_pipeline::register_listing_pipeline(registry);
  offer_pipeline::register_offer_pipelines(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
  webhook_pipeline::register_webhook_pipeline(registry);
  inspection_pipeline::register_inspection_pipelines(registry);
  order_pipeline::register_order_pipelines(registry);
  dispute_pipeline::register_dispute_pipelines(registry);

  tracing::info!(count = registry.len(), "All action pipelines registered.");
}
