// noskem/src/pipelines/listing_pipeline.rs

use crate::db::Rpc;
use crate::errors::{AppError, Result};
use crate::pipelines::common_steps::{self, remote_error, returned_id, CATEGORIES_PATH, ITEMS_PATH};
use crate::pipelines::contexts::CreateListingCtx;
use crate::pipelines::validation;
use crate::services::alerts::{queue_matches, ListedItem};
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_listing_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<CreateListingCtx, AppError>::new([
    StepSpec::required("validate_listing"),
    StepSpec::required("upload_images"),
    StepSpec::required("call_handle_new_item_listing"),
    StepSpec::optional("queue_search_alerts"),
    StepSpec::required("revalidate"),
  ]);

  p.on("validate_listing", validate_listing);
  p.on("upload_images", upload_images);
  p.on("call_handle_new_item_listing", call_handle_new_item_listing);
  p.on("queue_search_alerts", queue_search_alerts);
  p.on("revalidate", |ctx: Shared<CreateListingCtx>| async move {
    ctx.with(|c| common_steps::revalidate(&c.app_state, &[ITEMS_PATH, CATEGORIES_PATH]));
    Ok::<_, AppError>(Flow::Continue)
  });

  registry.register(p);
  info!("Listing pipeline registered.");
}

async fn validate_listing(ctx: Shared<CreateListingCtx>) -> Result<Flow> {
  ctx.with(|c| {
    let l = &c.listing;
    validation::title(&l.title)?;
    validation::description(&l.description)?;
    validation::price(l.price)?;
    validation::image_count(c.images.len())?;
    validation::coordinates(l.latitude, l.longitude)
  })?;
  Ok(Flow::Continue)
}

async fn upload_images(ctx: Shared<CreateListingCtx>) -> Result<Flow> {
  let (storage, seller_id, images) = ctx.update(|c| {
    (
      Arc::clone(&c.app_state.storage),
      c.seller_id,
      std::mem::take(&mut c.images),
    )
  });
  let urls = common_steps::upload_images(storage.as_ref(), seller_id, images).await?;
  ctx.update(|c| c.image_urls = urls);
  Ok(Flow::Continue)
}

async fn call_handle_new_item_listing(ctx: Shared<CreateListingCtx>) -> Result<Flow> {
  let (db, call) = ctx.with(|c| {
    let l = &c.listing;
    let location_text = l.location_text.as_deref().map(str::trim).filter(|s| !s.is_empty());
    (
      Arc::clone(&c.app_state.db),
      Rpc::HandleNewItemListing {
        seller_id: c.seller_id,
        title: l.title.trim().to_string(),
        description: l.description.trim().to_string(),
        category_id: l.category_id,
        price: l.price,
        condition: l.condition,
        location_text: location_text.map(str::to_string),
        latitude: l.latitude,
        longitude: l.longitude,
        image_urls: c.image_urls.clone(),
      },
    )
  });

  let result = db
    .rpc(&call)
    .await
    .map_err(|e| remote_error(e, "Could not create listing"))?;
  let item_id = returned_id(&result, &["id", "item_id"])
    .ok_or_else(|| AppError::Internal("Listing procedure returned no item id".to_string()))?;

  info!(%item_id, "Listing created.");
  ctx.update(|c| c.item_id = Some(item_id));
  Ok(Flow::Continue)
}

async fn queue_search_alerts(ctx: Shared<CreateListingCtx>) -> Result<Flow> {
  let (db, alerts, item) = ctx.with(|c| {
    let item = c.item_id.map(|id| ListedItem {
      id,
      seller_id: c.seller_id,
      title: c.listing.title.trim().to_string(),
      description: c.listing.description.clone(),
      category_id: Some(c.listing.category_id),
      price: c.listing.price,
    });
    (Arc::clone(&c.app_state.db), c.app_state.alerts.clone(), item)
  });
  let Some(item) = item else {
    return Ok(Flow::Continue);
  };

  match queue_matches(db.as_ref(), &alerts, &item).await {
    Ok(queued) => ctx.update(|c| c.alerts_queued = queued),
    Err(e) => warn!(item_id = %item.id, error = %e, "Saved-search alerts skipped."),
  }
  Ok(Flow::Continue)
}
