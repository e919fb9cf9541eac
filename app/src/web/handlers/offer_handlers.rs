// noskem/src/web/handlers/offer_handlers.rs

use actix_web::{web, HttpResponse};
use noskem_core::Shared;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::run_action;
use crate::errors::{AppError, Result};
use crate::models::OfferStatus;
use crate::pipelines::contexts::{MakeOfferCtx, RespondOfferCtx};
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct MakeOfferRequest {
  pub amount: f64,
  #[serde(default)]
  pub message: Option<String>,
}

#[instrument(name = "handler::make_offer", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, item_id = %path.as_ref()))]
pub async fn make_offer_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<MakeOfferRequest>,
) -> Result<HttpResponse> {
  let MakeOfferRequest { amount, message } = body.into_inner();
  let ctx = Shared::new(MakeOfferCtx {
    app_state: app_state.get_ref().clone(),
    buyer_id: auth_user.user_id,
    item_id: path.into_inner(),
    amount,
    message,
    item: None,
    offer: None,
  });
  run_action(&app_state, &ctx).await?;

  let offer = ctx
    .with(|c| c.offer.clone())
    .ok_or_else(|| AppError::Internal("Offer was placed but not returned".to_string()))?;
  Ok(HttpResponse::Created().json(offer))
}

#[derive(Debug, Deserialize)]
pub struct RespondOfferRequest {
  pub accept: bool,
}

#[instrument(name = "handler::respond_offer", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, offer_id = %path.as_ref()))]
pub async fn respond_offer_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<RespondOfferRequest>,
) -> Result<HttpResponse> {
  let accept = body.accept;
  let offer_id = path.into_inner();
  let ctx = Shared::new(RespondOfferCtx {
    app_state: app_state.get_ref().clone(),
    seller_id: auth_user.user_id,
    offer_id,
    accept,
    offer: None,
    order_id: None,
  });
  run_action(&app_state, &ctx).await?;

  let order_id = ctx.with(|c| c.order_id);
  let status = if accept { OfferStatus::Accepted } else { OfferStatus::Rejected };
  info!(%offer_id, status = status.as_str(), "Offer answered.");
  Ok(HttpResponse::Ok().json(json!({
    "offer_id": offer_id,
    "status": status,
    "order_id": order_id,
  })))
}
