// noskem/src/pipelines/inspection_pipeline.rs

//! Agent actions on an order: the inspection report and logistics status updates.

use crate::db::Rpc;
use crate::errors::{AppError, Result};
use crate::models::NotificationKind;
use crate::pipelines::common_steps::{self, remote_error};
use crate::pipelines::contexts::{InspectionCtx, OrderStatusCtx};
use crate::pipelines::validation;
use crate::services::notifications::notify_or_warn;
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use std::sync::Arc;
use tracing::info;

const MAX_REPORT_PHOTOS: usize = 8;

pub fn register_inspection_pipelines(registry: &Registry<AppError>) {
  let mut report = Pipeline::<InspectionCtx, AppError>::new([
    StepSpec::required("authorize_agent"),
    StepSpec::required("validate_report"),
    StepSpec::optional("upload_photos"),
    StepSpec::required("submit_report"),
    StepSpec::optional("notify_parties"),
  ]);
  report.on("authorize_agent", |ctx: Shared<InspectionCtx>| async move {
    let (db, agent_id, order_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.agent_id, c.order_id));
    let order = common_steps::authorize_agent_for_order(db.as_ref(), agent_id, order_id).await?;
    ctx.update(|c| c.order = Some(order));
    Ok::<_, AppError>(Flow::Continue)
  });
  report.on("validate_report", validate_report);
  report.on("upload_photos", upload_photos);
  report.on("submit_report", submit_report);
  report.on("notify_parties", notify_parties);
  registry.register(report);

  let mut status = Pipeline::<OrderStatusCtx, AppError>::new([
    StepSpec::required("authorize_actor"),
    StepSpec::required("validate_status"),
    StepSpec::required("update_status"),
    StepSpec::optional("notify_buyer"),
  ]);
  status.on("authorize_actor", |ctx: Shared<OrderStatusCtx>| async move {
    let (db, actor_id, order_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.actor_id, c.order_id));
    let order = common_steps::authorize_agent_for_order(db.as_ref(), actor_id, order_id).await?;
    ctx.update(|c| c.order = Some(order));
    Ok::<_, AppError>(Flow::Continue)
  });
  status.on("validate_status", |ctx: Shared<OrderStatusCtx>| async move {
    ctx.with(|c| validation::manual_status(c.new_status))?;
    Ok::<_, AppError>(Flow::Continue)
  });
  status.on("update_status", update_status);
  status.on("notify_buyer", notify_status_change);
  registry.register(status);

  info!("Inspection pipelines registered.");
}

async fn validate_report(ctx: Shared<InspectionCtx>) -> Result<Flow> {
  ctx.with(|c| {
    let notes = c.notes.trim();
    if !c.passed && notes.is_empty() {
      return Err(AppError::Validation("Explain why the item failed inspection".to_string()));
    }
    if notes.chars().count() > 5000 {
      return Err(AppError::Validation("Notes must be 5000 characters or fewer".to_string()));
    }
    if c.photos.len() > MAX_REPORT_PHOTOS {
      return Err(AppError::Validation("A report can have at most 8 photos".to_string()));
    }
    Ok(())
  })?;
  Ok(Flow::Continue)
}

async fn upload_photos(ctx: Shared<InspectionCtx>) -> Result<Flow> {
  let (storage, agent_id, photos) = ctx.update(|c| {
    (
      Arc::clone(&c.app_state.storage),
      c.agent_id,
      std::mem::take(&mut c.photos),
    )
  });
  if photos.is_empty() {
    return Ok(Flow::Continue);
  }
  let urls = common_steps::upload_images(storage.as_ref(), agent_id, photos).await?;
  ctx.update(|c| c.photo_urls = urls);
  Ok(Flow::Continue)
}

async fn submit_report(ctx: Shared<InspectionCtx>) -> Result<Flow> {
  let (db, call) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      Rpc::SubmitInspectionReport {
        order_id: c.order_id,
        agent_id: c.agent_id,
        passed: c.passed,
        notes: c.notes.trim().to_string(),
        photo_urls: c.photo_urls.clone(),
      },
    )
  });
  db.rpc(&call)
    .await
    .map_err(|e| remote_error(e, "Could not submit inspection report"))?;
  info!(order_id = %ctx.with(|c| c.order_id), "Inspection report submitted.");
  Ok(Flow::Continue)
}

async fn notify_parties(ctx: Shared<InspectionCtx>) -> Result<Flow> {
  let (db, order, passed) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.order.clone(), c.passed));
  let Some(order) = order else {
    return Ok(Flow::Continue);
  };
  let link = format!("/orders/{}", order.id);
  let (buyer_msg, seller_msg) = if passed {
    ("Your item passed inspection and is on its way", "Your item passed inspection")
  } else {
    ("Your item failed inspection. A refund is being arranged", "Your item failed inspection")
  };
  notify_or_warn(db.as_ref(), order.buyer_id, NotificationKind::Inspection, buyer_msg, Some(&link)).await;
  notify_or_warn(db.as_ref(), order.seller_id, NotificationKind::Inspection, seller_msg, Some(&link)).await;
  Ok(Flow::Continue)
}

async fn update_status(ctx: Shared<OrderStatusCtx>) -> Result<Flow> {
  let (db, call) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      Rpc::UpdateOrderStatus {
        order_id: c.order_id,
        actor_id: c.actor_id,
        new_status: c.new_status,
      },
    )
  });
  db.rpc(&call)
    .await
    .map_err(|e| remote_error(e, "Could not update order status"))?;
  Ok(Flow::Continue)
}

async fn notify_status_change(ctx: Shared<OrderStatusCtx>) -> Result<Flow> {
  let (db, order, status) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.order.clone(), c.new_status));
  if let Some(order) = order {
    let message = format!("Your order is now {}", status.as_str().replace('_', " "));
    let link = format!("/orders/{}", order.id);
    notify_or_warn(db.as_ref(), order.buyer_id, NotificationKind::Order, &message, Some(&link)).await;
  }
  Ok(Flow::Continue)
}
