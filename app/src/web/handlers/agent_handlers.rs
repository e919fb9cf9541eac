// noskem/src/web/handlers/agent_handlers.rs

//! Inspection agents: their queue, reports and logistics updates.

use actix_web::{web, HttpResponse};
use noskem_core::Shared;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{fetch_page, run_action};
use crate::db::{Select, Table};
use crate::errors::Result;
use crate::models::{Order, OrderStatus, Role};
use crate::pipelines::contexts::{ImageUpload, InspectionCtx, OrderStatusCtx};
use crate::services::auth_service::require_role;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;
use crate::web::pagination::PageQuery;

#[instrument(name = "handler::agent_orders", skip(app_state, auth_user, page), fields(user_id = %auth_user.user_id))]
pub async fn agent_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
  let db = app_state.db.as_ref();
  require_role(db, auth_user.user_id, &[Role::Agent, Role::Admin]).await?;
  let query = Select::table(Table::Orders).eq("agent_id", auth_user.user_id).newest_first();
  let orders = fetch_page::<Order>(db, query, page.into_inner().resolve(), "Could not load assigned orders").await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[derive(Debug, Deserialize)]
pub struct InspectionRequest {
  pub passed: bool,
  #[serde(default)]
  pub notes: String,
  #[serde(default)]
  pub photos: Vec<ImageUpload>,
}

#[instrument(name = "handler::submit_inspection", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn submit_inspection_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<InspectionRequest>,
) -> Result<HttpResponse> {
  let InspectionRequest { passed, notes, photos } = body.into_inner();
  let order_id = path.into_inner();
  let ctx = Shared::new(InspectionCtx {
    app_state: app_state.get_ref().clone(),
    agent_id: auth_user.user_id,
    order_id,
    passed,
    notes,
    photos,
    photo_urls: Vec::new(),
    order: None,
  });
  run_action(&app_state, &ctx).await?;

  let photo_urls = ctx.with(|c| c.photo_urls.clone());
  info!(%order_id, passed, "Inspection recorded.");
  Ok(HttpResponse::Created().json(json!({
    "order_id": order_id,
    "passed": passed,
    "photo_urls": photo_urls,
  })))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
  pub status: OrderStatus,
}

#[instrument(name = "handler::update_order_status", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<StatusRequest>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let new_status = body.status;
  let ctx = Shared::new(OrderStatusCtx {
    app_state: app_state.get_ref().clone(),
    actor_id: auth_user.user_id,
    order_id,
    new_status,
    order: None,
  });
  run_action(&app_state, &ctx).await?;
  Ok(HttpResponse::Ok().json(json!({ "order_id": order_id, "status": new_status })))
}
