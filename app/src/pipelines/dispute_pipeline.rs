// noskem/src/pipelines/dispute_pipeline.rs

use crate::db::{Rpc, Table};
use crate::errors::{AppError, Result};
use crate::pipelines::common_steps::{self, remote_error};
use crate::pipelines::contexts::{DisputeMessageCtx, OpenDisputeCtx};
use crate::pipelines::validation;
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub fn register_dispute_pipelines(registry: &Registry<AppError>) {
  let mut open = Pipeline::<OpenDisputeCtx, AppError>::new([
    StepSpec::required("validate_reason"),
    StepSpec::required("call_open_dispute"),
    StepSpec::required("post_opening_message"),
  ]);
  open.on("validate_reason", |ctx: Shared<OpenDisputeCtx>| async move {
    ctx.with(|c| validation::dispute_reason(&c.reason))?;
    Ok::<_, AppError>(Flow::Continue)
  });
  open.on("call_open_dispute", call_open_dispute);
  open.on("post_opening_message", post_opening_message);
  registry.register(open);

  let mut message = Pipeline::<DisputeMessageCtx, AppError>::new([
    StepSpec::required("validate_message"),
    StepSpec::required("load_order"),
    StepSpec::required("authorize_participant"),
    StepSpec::required("insert_message"),
  ]);
  message.on("validate_message", |ctx: Shared<DisputeMessageCtx>| async move {
    ctx.with(|c| validation::dispute_message(&c.message))?;
    Ok::<_, AppError>(Flow::Continue)
  });
  message.on("load_order", |ctx: Shared<DisputeMessageCtx>| async move {
    let (db, order_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.order_id));
    let order = common_steps::fetch_order(db.as_ref(), order_id).await?;
    ctx.update(|c| c.order = Some(order));
    Ok::<_, AppError>(Flow::Continue)
  });
  message.on("authorize_participant", |ctx: Shared<DisputeMessageCtx>| async move {
    let (db, sender_id, order) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.sender_id, c.order.clone()));
    let order = order.ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    common_steps::ensure_order_participant(db.as_ref(), sender_id, &order).await?;
    Ok::<_, AppError>(Flow::Continue)
  });
  message.on("insert_message", insert_message);
  registry.register(message);

  info!("Dispute pipelines registered.");
}

async fn call_open_dispute(ctx: Shared<OpenDisputeCtx>) -> Result<Flow> {
  let (db, call) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      Rpc::OpenDispute {
        order_id: c.order_id,
        user_id: c.user_id,
        reason: c.reason.trim().to_string(),
      },
    )
  });
  db.rpc(&call)
    .await
    .map_err(|e| remote_error(e, "Could not open dispute"))?;
  info!(order_id = %ctx.with(|c| c.order_id), "Dispute opened.");
  Ok(Flow::Continue)
}

async fn post_opening_message(ctx: Shared<OpenDisputeCtx>) -> Result<Flow> {
  let (db, row) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      json!({ "order_id": c.order_id, "sender_id": c.user_id, "message": c.reason.trim() }),
    )
  });
  db.insert(Table::DisputeMessages, row)
    .await
    .map_err(|e| remote_error(e, "Dispute opened, but the first message was not saved"))?;
  ctx.update(|c| c.message_posted = true);
  Ok(Flow::Continue)
}

async fn insert_message(ctx: Shared<DisputeMessageCtx>) -> Result<Flow> {
  let (db, row) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      json!({ "order_id": c.order_id, "sender_id": c.sender_id, "message": c.message.trim() }),
    )
  });
  let stored = db
    .insert(Table::DisputeMessages, row)
    .await
    .map_err(|e| remote_error(e, "Could not send message"))?;
  ctx.update(|c| c.posted = Some(stored));
  Ok(Flow::Continue)
}
