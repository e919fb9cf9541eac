// noskem/src/web/handlers/listing_handlers.rs

use actix_web::{web, HttpResponse};
use noskem_core::Shared;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use super::run_action;
use crate::db::{decode_row, Filter, Table};
use crate::errors::{AppError, Result};
use crate::models::{Item, ItemCondition, ItemStatus};
use crate::pipelines::common_steps::{self, fetch_item, remote_error, ITEMS_PATH};
use crate::pipelines::contexts::{CreateListingCtx, ImageUpload, NewListing};
use crate::pipelines::validation;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
  #[serde(flatten)]
  pub listing: NewListing,
  #[serde(default)]
  pub images: Vec<ImageUpload>,
}

#[instrument(name = "handler::create_listing", skip(app_state, auth_user, body), fields(user_id = %auth_user.user_id))]
pub async fn create_listing_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<CreateListingRequest>,
) -> Result<HttpResponse> {
  let CreateListingRequest { listing, images } = body.into_inner();
  info!(images = images.len(), "Listing submitted.");

  let ctx = Shared::new(CreateListingCtx {
    app_state: app_state.get_ref().clone(),
    seller_id: auth_user.user_id,
    listing,
    images,
    image_urls: Vec::new(),
    item_id: None,
    alerts_queued: 0,
  });
  run_action(&app_state, &ctx).await?;

  let (item_id, image_urls, alerts_queued) = ctx.with(|c| (c.item_id, c.image_urls.clone(), c.alerts_queued));
  let item_id = item_id.ok_or_else(|| AppError::Internal("Listing was created without an id".to_string()))?;
  Ok(HttpResponse::Created().json(json!({
    "item_id": item_id,
    "image_urls": image_urls,
    "alerts_queued": alerts_queued,
  })))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
  pub title: Option<String>,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub condition: Option<ItemCondition>,
  pub category_id: Option<Uuid>,
  pub location_text: Option<String>,
}

impl UpdateListingRequest {
  pub fn to_patch(&self) -> Result<Value> {
    let mut patch = Map::new();
    if let Some(title) = &self.title {
      validation::title(title)?;
      patch.insert("title".to_string(), json!(title.trim()));
    }
    if let Some(description) = &self.description {
      validation::description(description)?;
      patch.insert("description".to_string(), json!(description.trim()));
    }
    if let Some(price) = self.price {
      validation::price(price)?;
      patch.insert("price".to_string(), json!(price));
    }
    if let Some(condition) = self.condition {
      patch.insert("condition".to_string(), json!(condition));
    }
    if let Some(category_id) = self.category_id {
      patch.insert("category_id".to_string(), json!(category_id));
    }
    if let Some(location) = &self.location_text {
      let location = location.trim();
      patch.insert(
        "location_text".to_string(),
        if location.is_empty() { Value::Null } else { json!(location) },
      );
    }
    if patch.is_empty() {
      return Err(AppError::Validation("Nothing to update".to_string()));
    }
    Ok(Value::Object(patch))
  }
}

/// Loads the caller's own listing in a state that still allows edits.
async fn editable_listing(app_state: &AppState, seller_id: Uuid, item_id: Uuid) -> Result<Item> {
  let item = fetch_item(app_state.db.as_ref(), item_id).await?;
  if item.seller_id != seller_id {
    return Err(AppError::Forbidden("You can only change your own listings".to_string()));
  }
  match item.status {
    ItemStatus::Available | ItemStatus::PendingInspection => Ok(item),
    _ => Err(AppError::Validation("This listing can no longer be changed".to_string())),
  }
}

#[instrument(name = "handler::update_listing", skip(app_state, auth_user, path, body), fields(user_id = %auth_user.user_id))]
pub async fn update_listing_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  body: web::Json<UpdateListingRequest>,
) -> Result<HttpResponse> {
  let item_id = path.into_inner();
  let patch = body.to_patch()?;
  editable_listing(&app_state, auth_user.user_id, item_id).await?;

  let row = app_state
    .db
    .update(
      Table::Items,
      &[Filter::eq("id", item_id), Filter::eq("seller_id", auth_user.user_id)],
      patch,
    )
    .await
    .map_err(|e| remote_error(e, "Could not update listing"))?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
  let item: Item = decode_row(row)?;

  common_steps::revalidate(&app_state, &[ITEMS_PATH]);
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::archive_listing", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn archive_listing_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let item_id = path.into_inner();
  editable_listing(&app_state, auth_user.user_id, item_id).await?;

  app_state
    .db
    .update(
      Table::Items,
      &[Filter::eq("id", item_id), Filter::eq("seller_id", auth_user.user_id)],
      json!({ "status": ItemStatus::Archived }),
    )
    .await
    .map_err(|e| remote_error(e, "Could not archive listing"))?;

  info!(%item_id, "Listing archived.");
  common_steps::revalidate(&app_state, &[ITEMS_PATH]);
  Ok(HttpResponse::Ok().json(json!({ "item_id": item_id, "status": ItemStatus::Archived })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn listing_patch_validates_each_field() {
    let ok = UpdateListingRequest {
      price: Some(45.5),
      condition: Some(ItemCondition::LikeNew),
      ..Default::default()
    };
    assert_eq!(ok.to_patch().unwrap(), json!({ "price": 45.5, "condition": "like_new" }));

    let bad = UpdateListingRequest {
      title: Some("ab".to_string()),
      ..Default::default()
    };
    assert!(matches!(bad.to_patch(), Err(AppError::Validation(_))));
    assert!(UpdateListingRequest::default().to_patch().is_err());
  }
}
