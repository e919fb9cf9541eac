// noskem/src/pipelines/checkout_pipeline.rs

//! Checkout: reserve the item as an order, then hand the buyer to Paystack.
//!
//! The order is only marked paid by the signed webhook; this pipeline ends
//! once the buyer has an authorization URL to visit.

use crate::db::{Filter, Rpc, Table};
use crate::errors::{AppError, Result};
use crate::pipelines::common_steps::{self, remote_error, returned_id};
use crate::pipelines::contexts::CheckoutCtx;
use crate::services::auth_service::load_profile;
use crate::services::paystack::{new_reference, to_minor_units, InitializeTransaction, PaymentMetadata};
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub fn register_checkout_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<CheckoutCtx, AppError>::new([
    StepSpec::required("create_order"),
    StepSpec::required("load_buyer_email"),
    StepSpec::required("initialize_payment"),
    StepSpec::required("record_reference"),
  ]);

  p.on("create_order", create_order);
  p.on("load_buyer_email", load_buyer_email);
  p.on("initialize_payment", initialize_payment);
  p.on("record_reference", record_reference);

  registry.register(p);
  info!("Checkout pipeline registered.");
}

async fn create_order(ctx: Shared<CheckoutCtx>) -> Result<Flow> {
  let (db, call) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      Rpc::CreateOrder {
        item_id: c.item_id,
        buyer_id: c.buyer_id,
        offer_id: c.offer_id,
      },
    )
  });
  let result = db
    .rpc(&call)
    .await
    .map_err(|e| remote_error(e, "Could not create order"))?;
  let order_id = returned_id(&result, &["id", "order_id"])
    .ok_or_else(|| AppError::Internal("Order procedure returned no order id".to_string()))?;
  let order = common_steps::fetch_order(db.as_ref(), order_id).await?;
  info!(%order_id, total = order.total_amount, "Order created.");
  ctx.update(|c| c.order = Some(order));
  Ok(Flow::Continue)
}

/// Profile email first, then the session's email claim.
async fn load_buyer_email(ctx: Shared<CheckoutCtx>) -> Result<Flow> {
  let (db, buyer_id, session_email) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.buyer_id, c.session_email.clone()));
  let profile = load_profile(db.as_ref(), buyer_id).await?;
  let email = [profile.email, session_email]
    .into_iter()
    .flatten()
    .map(|e| e.trim().to_string())
    .find(|e| e.contains('@'))
    .ok_or_else(|| AppError::Validation("Add an email address to your profile before checking out".to_string()))?;
  ctx.update(|c| c.buyer_email = Some(email));
  Ok(Flow::Continue)
}

async fn initialize_payment(ctx: Shared<CheckoutCtx>) -> Result<Flow> {
  let (payments, request) = ctx.with(|c| -> Result<_> {
    let order = c
      .order
      .as_ref()
      .ok_or_else(|| AppError::Internal("Checkout reached payment without an order".to_string()))?;
    let config = &c.app_state.config;
    let request = InitializeTransaction {
      email: c.buyer_email.clone().unwrap_or_default(),
      amount: to_minor_units(order.total_amount)?,
      currency: config.paystack_currency.clone(),
      reference: new_reference(),
      callback_url: format!("{}/api/v1/orders/{}/payment/callback", config.app_base_url, order.id),
      metadata: PaymentMetadata {
        order_id: order.id,
        user_id: c.buyer_id,
      },
    };
    Ok((Arc::clone(&c.app_state.payments), request))
  })?;

  let authorization = payments.initialize(&request).await?;
  ctx.update(|c| c.authorization = Some(authorization));
  Ok(Flow::Continue)
}

async fn record_reference(ctx: Shared<CheckoutCtx>) -> Result<Flow> {
  let (db, order_id, reference) = ctx.with(|c| {
    (
      Arc::clone(&c.app_state.db),
      c.order.as_ref().map(|o| o.id),
      c.authorization.as_ref().map(|a| a.reference.clone()),
    )
  });
  let (Some(order_id), Some(reference)) = (order_id, reference) else {
    return Err(AppError::Internal("Checkout finished without a payment reference".to_string()));
  };
  db.update(
    Table::Orders,
    &[Filter::eq("id", order_id)],
    json!({ "payment_reference": reference }),
  )
  .await
  .map_err(|e| remote_error(e, "Could not record payment reference"))?;
  info!(%order_id, %reference, "Checkout ready for payment.");
  Ok(Flow::Continue)
}
