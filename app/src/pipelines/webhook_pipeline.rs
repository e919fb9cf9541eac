// noskem/src/pipelines/webhook_pipeline.rs

//! Paystack webhook: authenticate the raw body, then credit the order.

use crate::db::Rpc;
use crate::errors::{AppError, Result};
use crate::pipelines::common_steps::{self, remote_error, ITEMS_PATH};
use crate::pipelines::contexts::{PaymentWebhookCtx, WebhookEvent};
use crate::services::webhook_signature;
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub fn register_webhook_pipeline(registry: &Registry<AppError>) {
  let not_a_charge = |ctx: &Shared<PaymentWebhookCtx>| !ctx.with(PaymentWebhookCtx::is_charge_success);
  let mut p = Pipeline::<PaymentWebhookCtx, AppError>::new([
    StepSpec::required("verify_signature"),
    StepSpec::required("parse_event"),
    StepSpec::required("process_payment").skip_when(not_a_charge),
    StepSpec::required("revalidate").skip_when(not_a_charge),
  ]);

  p.on("verify_signature", verify_signature);
  p.on("parse_event", parse_event);
  p.on("process_payment", process_payment);
  p.on("revalidate", |ctx: Shared<PaymentWebhookCtx>| async move {
    ctx.with(|c| common_steps::revalidate(&c.app_state, &[ITEMS_PATH]));
    Ok::<_, AppError>(Flow::Continue)
  });

  registry.register(p);
  info!("Payment webhook pipeline registered.");
}

async fn verify_signature(ctx: Shared<PaymentWebhookCtx>) -> Result<Flow> {
  ctx.with(|c| {
    webhook_signature::verify(
      &c.app_state.config.paystack_secret_key,
      &c.raw_body,
      c.signature.as_deref(),
    )
  })
  .map_err(|e| {
    warn!(reason = %e, "Webhook rejected.");
    AppError::Auth("Invalid webhook signature".to_string())
  })?;
  Ok(Flow::Continue)
}

async fn parse_event(ctx: Shared<PaymentWebhookCtx>) -> Result<Flow> {
  let event: WebhookEvent = ctx
    .with(|c| serde_json::from_slice(&c.raw_body))
    .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {}", e)))?;
  info!(event = %event.event, "Webhook event received.");
  ctx.update(|c| c.event = Some(event));
  Ok(Flow::Continue)
}

/// Reads a uuid from metadata, which Paystack may deliver as an object or as a JSON string.
fn metadata_uuid(metadata: &Value, key: &str) -> Option<Uuid> {
  let object = match metadata {
    Value::String(raw) => serde_json::from_str::<Value>(raw).ok()?,
    other => other.clone(),
  };
  object.get(key)?.as_str().and_then(|s| Uuid::parse_str(s).ok())
}

async fn process_payment(ctx: Shared<PaymentWebhookCtx>) -> Result<Flow> {
  let (db, data) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.event.as_ref().map(|e| e.data.clone())));
  let data = data.unwrap_or_default();
  let metadata = data.metadata.unwrap_or(Value::Null);

  let (Some(order_id), Some(user_id), Some(reference)) = (
    metadata_uuid(&metadata, "order_id"),
    metadata_uuid(&metadata, "user_id"),
    data.reference.filter(|r| !r.is_empty()),
  ) else {
    return Err(AppError::Validation(
      "charge.success is missing order_id, user_id or reference".to_string(),
    ));
  };

  db.rpc(&Rpc::ProcessOrderPayment {
    order_id,
    user_id,
    reference: reference.clone(),
  })
  .await
  .map_err(|e| remote_error(e, "Payment could not be applied"))?;

  info!(%order_id, %reference, "Payment applied to order.");
  ctx.update(|c| {
    c.order_id = Some(order_id);
    c.processed = true;
  });
  Ok(Flow::Continue)
}
