// noskem/src/pipelines/common_steps.rs

//! Pieces several pipelines share: loading rows by id, participant
//! checks, inline image uploads and cache revalidation.

use crate::db::{decode_row, DbError, RemoteDb, Select, Table};
use crate::errors::{AppError, Result};
use crate::models::{Item, Order, Role};
use crate::pipelines::contexts::ImageUpload;
use crate::services::auth_service::{load_profile, require_role};
use crate::services::storage::{object_path, validate_image, ObjectStorage};
use crate::state::AppState;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

pub const ITEMS_PATH: &str = "/api/v1/items";
pub const CATEGORIES_PATH: &str = "/api/v1/categories";

/// Store failures keep their message; a refusal without one gets `fallback`.
pub fn remote_error(err: DbError, fallback: &str) -> AppError {
  match err {
    DbError::Rejected { message } => AppError::remote_or(Some(message), fallback),
    other => AppError::from(other),
  }
}

/// Id a procedure returned, either as a bare value or under one of `keys`.
pub fn returned_id(value: &Value, keys: &[&str]) -> Option<Uuid> {
  match value {
    Value::String(s) => Uuid::parse_str(s).ok(),
    Value::Object(map) => keys
      .iter()
      .filter_map(|k| map.get(*k))
      .find_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok())),
    _ => None,
  }
}

pub async fn fetch_item(db: &dyn RemoteDb, item_id: Uuid) -> Result<Item> {
  let row = db
    .select(&Select::table(Table::Items).eq("id", item_id).limit(1))
    .await?
    .first()
    .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
  Ok(decode_row(row)?)
}

pub async fn fetch_order(db: &dyn RemoteDb, order_id: Uuid) -> Result<Order> {
  let row = db
    .select(&Select::table(Table::Orders).eq("id", order_id).limit(1))
    .await?
    .first()
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  Ok(decode_row(row)?)
}

/// Buyer, seller and the assigned agent see an order; anyone else must be an admin.
pub async fn ensure_order_participant(db: &dyn RemoteDb, user_id: Uuid, order: &Order) -> Result<()> {
  if order.is_party(user_id) || order.agent_id == Some(user_id) {
    return Ok(());
  }
  match load_profile(db, user_id).await {
    Ok(profile) if profile.role == Role::Admin => Ok(()),
    Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::NotFound("Order not found".to_string())),
    Err(other) => Err(other),
  }
}

/// Agents act only on orders assigned to them; admins on any order.
pub async fn authorize_agent_for_order(db: &dyn RemoteDb, actor_id: Uuid, order_id: Uuid) -> Result<Order> {
  let profile = require_role(db, actor_id, &[Role::Agent, Role::Admin]).await?;
  let order = fetch_order(db, order_id).await?;
  if profile.role == Role::Agent && order.agent_id != Some(actor_id) {
    return Err(AppError::Forbidden("This order is not assigned to you".to_string()));
  }
  Ok(order)
}

/// Checks every image first, then uploads them in order under `owner`.
#[instrument(name = "common_step::upload_images", skip(storage, images), fields(count = images.len()), err(Display))]
pub async fn upload_images(storage: &dyn ObjectStorage, owner: Uuid, images: Vec<ImageUpload>) -> Result<Vec<String>> {
  let mut checked = Vec::with_capacity(images.len());
  for image in images {
    let ext = validate_image(&image.content_type, image.data.len())?;
    checked.push((ext, image));
  }
  let mut urls = Vec::with_capacity(checked.len());
  for (ext, image) in checked {
    let path = object_path(owner, ext);
    urls.push(storage.upload(&path, &image.content_type, image.data).await?);
  }
  Ok(urls)
}

pub fn revalidate(app_state: &AppState, paths: &[&str]) {
  let dropped = app_state.page_cache.revalidate(paths);
  info!(?paths, dropped, "Revalidated cached pages.");
}
