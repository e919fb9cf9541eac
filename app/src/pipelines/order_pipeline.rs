// noskem/src/pipelines/order_pipeline.rs

//! Buyer actions after payment: confirming delivery and reviewing the trade.

use crate::db::{decode_row, Rpc, Table};
use crate::errors::{AppError, Result};
use crate::models::{NotificationKind, OrderStatus, Review};
use crate::pipelines::common_steps::{self, remote_error, ITEMS_PATH};
use crate::pipelines::contexts::{ConfirmDeliveryCtx, ReviewCtx};
use crate::pipelines::validation;
use crate::services::notifications::notify_or_warn;
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_order_pipelines(registry: &Registry<AppError>) {
  let mut delivery = Pipeline::<ConfirmDeliveryCtx, AppError>::new([
    StepSpec::required("call_release_escrow"),
    StepSpec::optional("notify_seller"),
    StepSpec::required("revalidate"),
  ]);
  delivery.on("call_release_escrow", call_release_escrow);
  delivery.on("notify_seller", notify_seller_of_release);
  delivery.on("revalidate", |ctx: Shared<ConfirmDeliveryCtx>| async move {
    ctx.with(|c| common_steps::revalidate(&c.app_state, &[ITEMS_PATH]));
    Ok::<_, AppError>(Flow::Continue)
  });
  registry.register(delivery);

  let mut review = Pipeline::<ReviewCtx, AppError>::new([
    StepSpec::required("validate_review"),
    StepSpec::required("load_order"),
    StepSpec::required("authorize_reviewer"),
    StepSpec::required("insert_review"),
    StepSpec::optional("notify_reviewee"),
  ]);
  review.on("validate_review", |ctx: Shared<ReviewCtx>| async move {
    ctx.with(|c| {
      validation::rating(c.rating)?;
      validation::review_comment(c.comment.as_deref())
    })?;
    Ok::<_, AppError>(Flow::Continue)
  });
  review.on("load_order", |ctx: Shared<ReviewCtx>| async move {
    let (db, order_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.order_id));
    let order = common_steps::fetch_order(db.as_ref(), order_id).await?;
    ctx.update(|c| c.order = Some(order));
    Ok::<_, AppError>(Flow::Continue)
  });
  review.on("authorize_reviewer", authorize_reviewer);
  review.on("insert_review", insert_review);
  review.on("notify_reviewee", notify_reviewee);
  registry.register(review);

  info!("Order pipelines registered.");
}

async fn call_release_escrow(ctx: Shared<ConfirmDeliveryCtx>) -> Result<Flow> {
  let (db, order_id, buyer_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.order_id, c.buyer_id));
  db.rpc(&Rpc::ReleaseEscrow { order_id, buyer_id })
    .await
    .map_err(|e| remote_error(e, "Could not confirm delivery"))?;
  info!(%order_id, "Escrow released.");
  Ok(Flow::Continue)
}

async fn notify_seller_of_release(ctx: Shared<ConfirmDeliveryCtx>) -> Result<Flow> {
  let (db, order_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.order_id));
  let order = match common_steps::fetch_order(db.as_ref(), order_id).await {
    Ok(order) => order,
    Err(e) => {
      warn!(%order_id, error = %e, "Seller not told about the release.");
      return Ok(Flow::Continue);
    }
  };
  let link = format!("/orders/{}", order.id);
  notify_or_warn(
    db.as_ref(),
    order.seller_id,
    NotificationKind::Payment,
    "The buyer confirmed delivery. Your payout has been released",
    Some(&link),
  )
  .await;
  Ok(Flow::Continue)
}

async fn authorize_reviewer(ctx: Shared<ReviewCtx>) -> Result<Flow> {
  ctx.with(|c| {
    let order = c
      .order
      .as_ref()
      .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    if !order.is_party(c.reviewer_id) {
      return Err(AppError::Forbidden("Only the buyer or seller can review this order".to_string()));
    }
    if order.status != OrderStatus::Completed {
      return Err(AppError::Validation("You can review an order once it is completed".to_string()));
    }
    Ok(())
  })?;
  Ok(Flow::Continue)
}

async fn insert_review(ctx: Shared<ReviewCtx>) -> Result<Flow> {
  let (db, row) = ctx.with(|c| {
    let reviewee_id = c.order.as_ref().map(|o| o.counterparty(c.reviewer_id));
    (
      Arc::clone(&c.app_state.db),
      json!({
        "order_id": c.order_id,
        "reviewer_id": c.reviewer_id,
        "reviewee_id": reviewee_id,
        "rating": c.rating,
        "comment": c.comment.as_deref().map(str::trim).filter(|s| !s.is_empty()),
      }),
    )
  });
  let stored = db
    .insert(Table::Reviews, row)
    .await
    .map_err(|e| remote_error(e, "Could not save review"))?;
  let review: Review = decode_row(stored)?;
  ctx.update(|c| c.review_id = Some(review.id));
  Ok(Flow::Continue)
}

async fn notify_reviewee(ctx: Shared<ReviewCtx>) -> Result<Flow> {
  let (db, target, rating) = ctx.with(|c| {
    let target = c.order.as_ref().map(|o| (o.counterparty(c.reviewer_id), o.id));
    (Arc::clone(&c.app_state.db), target, c.rating)
  });
  if let Some((reviewee_id, order_id)) = target {
    let message = format!("You received a {}-star review", rating);
    let link = format!("/orders/{}", order_id);
    notify_or_warn(db.as_ref(), reviewee_id, NotificationKind::Review, &message, Some(&link)).await;
  }
  Ok(Flow::Continue)
}
