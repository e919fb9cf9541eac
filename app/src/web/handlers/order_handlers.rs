// noskem/src/web/handlers/order_handlers.rs

//! Order pages and the buyer-side order actions: checkout, delivery, review, disputes.

use actix_web::{web, HttpResponse};
use noskem_core::Shared;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{read_failed, run_action};
use crate::db::{decode_row, decode_rows, Select, Table};
use crate::errors::{AppError, Result};
use crate::models::{DisputeMessage, InspectionReport, Item, Order};
use crate::pipelines::common_steps::ensure_order_participant;
use crate::pipelines::contexts::{CheckoutCtx, ConfirmDeliveryCtx, DisputeMessageCtx, OpenDisputeCtx, ReviewCtx};
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;

/// The order, visible to its participants only. Anyone else gets 404.
async fn load_visible_order(app_state: &AppState, user_id: Uuid, order_id: Uuid, message: &'static str) -> Result<Order> {
  let db = app_state.db.as_ref();
  let row = db
    .select(&Select::table(Table::Orders).eq("id", order_id).limit(1))
    .await
    .map_err(read_failed(message))?
    .first()
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let order: Order = decode_row(row).map_err(read_failed(message))?;
  ensure_order_participant(db, user_id, &order).await?;
  Ok(order)
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  const MESSAGE: &str = "Could not load order";
  let order = load_visible_order(&app_state, auth_user.user_id, path.into_inner(), MESSAGE).await?;
  let db = app_state.db.as_ref();

  let item: Option<Item> = match db
    .select(&Select::table(Table::Items).eq("id", order.item_id).limit(1))
    .await
    .map_err(read_failed(MESSAGE))?
    .first()
  {
    Some(row) => Some(decode_row(row).map_err(read_failed(MESSAGE))?),
    None => None,
  };
  let inspection: Option<InspectionReport> = match db
    .select(&Select::table(Table::InspectionReports).eq("order_id", order.id).newest_first().limit(1))
    .await
    .map_err(read_failed(MESSAGE))?
    .first()
  {
    Some(row) => Some(decode_row(row).map_err(read_failed(MESSAGE))?),
    None => None,
  };

  Ok(HttpResponse::Ok().json(json!({ "order": order, "item": item, "inspection": inspection })))
}

#[instrument(name = "handler::dispute_thread", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn dispute_thread_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  const MESSAGE: &str = "Could not load messages";
  let order = load_visible_order(&app_state, auth_user.user_id, path.into_inner(), MESSAGE).await?;
  let rows = app_state
    .db
    .select(&Select::table(Table::DisputeMessages).eq("order_id", order.id).order_by("created_at", false))
    .await
    .map_err(read_failed(MESSAGE))?;
  let messages: Vec<DisputeMessage> = decode_rows(rows.rows).map_err(read_failed(MESSAGE))?;
  Ok(HttpResponse::Ok().json(json!({ "order_id": order.id, "status": order.status, "messages": messages })))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
  pub item_id: Uuid,
  #[serde(default)]
  pub offer_id: Option<Uuid>,
}

#[instrument(name = "handler::checkout", skip(app_state, auth_user, body), fields(user_id = %auth_user.user_id, item_id = %body.item_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
  let CheckoutRequest { item_id, offer_id } = body.into_inner();
  let ctx = Shared::new(CheckoutCtx {
    app_state: app_state.get_ref().clone(),
    buyer_id: auth_user.user_id,
    item_id,
    offer_id,
    session_email: auth_user.email,
    order: None,
    buyer_email: None,
    authorization: None,
  });
  run_action(&app_state, &ctx).await?;

  let (order, authorization) = ctx.with(|c| (c.order.clone(), c.authorization.clone()));
  let (Some(order), Some(authorization)) = (order, authorization) else {
    warn!("Checkout completed without an order or payment link.");
    return Err(AppError::Internal("Checkout details are unavailable".to_string()));
  };
  info!(order_id = %order.id, reference = %authorization.reference, "Checkout started.");
  Ok(HttpResponse::Created().json(json!({
    "order_id": order.id,
    "amount": order.total_amount,
    "authorization_url": authorization.authorization_url,
    "access_code": authorization.access_code,
    "reference": authorization.reference,
  })))
}

#[derive(Debug, Deserialize)]
pub struct PaymentCallbackQuery {
  pub reference: String,
}

/// Where the gateway sends the buyer back. Reports the verified status; the
/// order itself is credited by the webhook.
#[instrument(name = "handler::payment_callback", skip(app_state, path, query), fields(order_id = %path.as_ref()))]
pub async fn payment_callback_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  query: web::Query<PaymentCallbackQuery>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let reference = query.reference.trim();
  if reference.is_empty() {
    return Err(AppError::Validation("Missing payment reference".to_string()));
  }

  const MESSAGE: &str = "Could not load order";
  let row = app_state
    .db
    .select(&Select::table(Table::Orders).eq("id", order_id).limit(1))
    .await
    .map_err(read_failed(MESSAGE))?
    .first()
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  let order: Order = decode_row(row).map_err(read_failed(MESSAGE))?;
  if order.payment_reference.as_deref() != Some(reference) {
    return Err(AppError::Validation("Payment reference does not match this order".to_string()));
  }

  let verification = app_state.payments.verify(reference).await?;
  info!(%order_id, status = %verification.status, "Payment verified.");
  Ok(HttpResponse::Ok().json(json!({
    "order_id": order_id,
    "reference": verification.reference,
    "payment_status": verification.status,
    "paid": verification.succeeded(),
    "order_status": order.status,
  })))
}

#[instrument(name = "handler::confirm_delivery", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn confirm_delivery_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let ctx = Shared::new(ConfirmDeliveryCtx {
    app_state: app_state.get_ref().clone(),
    buyer_id: auth_user.user_id,
    order_id,
  });
  run_action(&app_state, &ctx).await?;
  Ok(HttpResponse::Ok().json(json!({ "order_id": order_id, "confirmed": true })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
  pub rating: i32,
  #[serde(default)]
  pub comment: Option<String>,
}

#[instrument(name = "handler::leave_review", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn leave_review_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
  let ReviewRequest { rating, comment } = body.into_inner();
  let ctx = Shared::new(ReviewCtx {
    app_state: app_state.get_ref().clone(),
    reviewer_id: auth_user.user_id,
    order_id: path.into_inner(),
    rating,
    comment,
    order: None,
    review_id: None,
  });
  run_action(&app_state, &ctx).await?;
  let review_id = ctx.with(|c| c.review_id);
  Ok(HttpResponse::Created().json(json!({ "review_id": review_id })))
}

#[derive(Debug, Deserialize)]
pub struct OpenDisputeRequest {
  pub reason: String,
}

#[instrument(name = "handler::open_dispute", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn open_dispute_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<OpenDisputeRequest>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let ctx = Shared::new(OpenDisputeCtx {
    app_state: app_state.get_ref().clone(),
    user_id: auth_user.user_id,
    order_id,
    reason: body.into_inner().reason,
    message_posted: false,
  });
  run_action(&app_state, &ctx).await?;
  Ok(HttpResponse::Created().json(json!({ "order_id": order_id, "disputed": true })))
}

#[derive(Debug, Deserialize)]
pub struct DisputeMessageRequest {
  pub message: String,
}

#[instrument(name = "handler::post_dispute_message", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn post_dispute_message_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<DisputeMessageRequest>,
) -> Result<HttpResponse> {
  let ctx = Shared::new(DisputeMessageCtx {
    app_state: app_state.get_ref().clone(),
    sender_id: auth_user.user_id,
    order_id: path.into_inner(),
    message: body.into_inner().message,
    order: None,
    posted: None,
  });
  run_action(&app_state, &ctx).await?;
  let posted = ctx.with(|c| c.posted.clone());
  Ok(HttpResponse::Created().json(posted))
}
