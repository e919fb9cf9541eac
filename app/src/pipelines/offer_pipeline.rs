// noskem/src/pipelines/offer_pipeline.rs

//! Making an offer on a listing, and the seller's answer to it.

use crate::db::{decode_row, decode_rows, Filter, Rpc, Select, Table};
use crate::errors::{AppError, Result};
use crate::models::{ItemStatus, NotificationKind, Offer, OfferStatus};
use crate::pipelines::common_steps::{self, remote_error, returned_id, ITEMS_PATH};
use crate::pipelines::contexts::{MakeOfferCtx, RespondOfferCtx};
use crate::pipelines::validation;
use crate::services::notifications::notify_or_warn;
use noskem_core::{Flow, Pipeline, Registry, Shared, StepSpec};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub fn register_offer_pipelines(registry: &Registry<AppError>) {
  let mut make = Pipeline::<MakeOfferCtx, AppError>::new([
    StepSpec::required("validate_offer"),
    StepSpec::required("load_item"),
    StepSpec::required("insert_offer"),
    StepSpec::optional("notify_seller"),
    StepSpec::required("revalidate"),
  ]);
  make.on("validate_offer", |ctx: Shared<MakeOfferCtx>| async move {
    ctx.with(|c| validation::offer_amount(c.amount))?;
    Ok::<_, AppError>(Flow::Continue)
  });
  make.on("load_item", load_item);
  make.on("insert_offer", insert_offer);
  make.on("notify_seller", notify_seller);
  make.on("revalidate", |ctx: Shared<MakeOfferCtx>| async move {
    ctx.with(|c| {
      let item_path = format!("{}/{}", ITEMS_PATH, c.item_id);
      common_steps::revalidate(&c.app_state, &[item_path.as_str()])
    });
    Ok::<_, AppError>(Flow::Continue)
  });
  registry.register(make);

  let mut respond = Pipeline::<RespondOfferCtx, AppError>::new([
    StepSpec::required("load_offer"),
    StepSpec::required("authorize_seller"),
    StepSpec::required("apply_response"),
    StepSpec::optional("notify_buyer"),
    StepSpec::required("revalidate"),
  ]);
  respond.on("load_offer", load_offer);
  respond.on("authorize_seller", |ctx: Shared<RespondOfferCtx>| async move {
    let allowed = ctx.with(|c| c.offer.as_ref().is_some_and(|o| o.seller_id == c.seller_id));
    if !allowed {
      return Err(AppError::Forbidden("Only the seller can answer this offer".to_string()));
    }
    Ok(Flow::Continue)
  });
  respond.on("apply_response", apply_response);
  respond.on("notify_buyer", notify_buyer);
  respond.on("revalidate", |ctx: Shared<RespondOfferCtx>| async move {
    ctx.with(|c| common_steps::revalidate(&c.app_state, &[ITEMS_PATH]));
    Ok::<_, AppError>(Flow::Continue)
  });
  registry.register(respond);

  info!("Offer pipelines registered.");
}

async fn load_item(ctx: Shared<MakeOfferCtx>) -> Result<Flow> {
  let (db, item_id, buyer_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.item_id, c.buyer_id));
  let item = common_steps::fetch_item(db.as_ref(), item_id).await?;
  if item.seller_id == buyer_id {
    return Err(AppError::Validation("You cannot make an offer on your own item".to_string()));
  }
  if item.status != ItemStatus::Available {
    return Err(AppError::Validation("This item is not accepting offers".to_string()));
  }
  ctx.update(|c| c.item = Some(item));
  Ok(Flow::Continue)
}

async fn insert_offer(ctx: Shared<MakeOfferCtx>) -> Result<Flow> {
  let (db, row) = ctx.with(|c| {
    let seller_id = c.item.as_ref().map(|i| i.seller_id);
    (
      Arc::clone(&c.app_state.db),
      json!({
        "item_id": c.item_id,
        "buyer_id": c.buyer_id,
        "seller_id": seller_id,
        "amount": c.amount,
        "message": c.message.as_deref().map(str::trim).filter(|m| !m.is_empty()),
        "status": OfferStatus::Pending,
      }),
    )
  });
  let stored = db
    .insert(Table::Offers, row)
    .await
    .map_err(|e| remote_error(e, "Could not place offer"))?;
  let offer: Offer = decode_row(stored)?;
  info!(offer_id = %offer.id, "Offer placed.");
  ctx.update(|c| c.offer = Some(offer));
  Ok(Flow::Continue)
}

async fn notify_seller(ctx: Shared<MakeOfferCtx>) -> Result<Flow> {
  let (db, target) = ctx.with(|c| {
    let target = c.item.as_ref().map(|i| (i.seller_id, i.title.clone(), i.id));
    (Arc::clone(&c.app_state.db), target)
  });
  if let Some((seller_id, title, item_id)) = target {
    let amount = ctx.with(|c| c.amount);
    let message = format!("New offer of {:.2} on \"{}\"", amount, title);
    let link = format!("/items/{}", item_id);
    notify_or_warn(db.as_ref(), seller_id, NotificationKind::Offer, &message, Some(&link)).await;
  }
  Ok(Flow::Continue)
}

async fn load_offer(ctx: Shared<RespondOfferCtx>) -> Result<Flow> {
  let (db, offer_id) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.offer_id));
  let rows = db
    .select(&Select::table(Table::Offers).eq("id", offer_id).limit(1))
    .await?;
  let offer: Offer = rows
    .first()
    .map(decode_row)
    .transpose()?
    .ok_or_else(|| AppError::NotFound("Offer not found".to_string()))?;
  if offer.status != OfferStatus::Pending {
    return Err(AppError::Conflict("This offer has already been answered".to_string()));
  }
  ctx.update(|c| c.offer = Some(offer));
  Ok(Flow::Continue)
}

async fn apply_response(ctx: Shared<RespondOfferCtx>) -> Result<Flow> {
  let (db, offer_id, seller_id, accept) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.offer_id, c.seller_id, c.accept));

  if accept {
    let result = db
      .rpc(&Rpc::AcceptOffer { offer_id, seller_id })
      .await
      .map_err(|e| remote_error(e, "Could not accept offer"))?;
    let order_id = returned_id(&result, &["order_id", "id"]);
    info!(%offer_id, ?order_id, "Offer accepted.");
    ctx.update(|c| c.order_id = order_id);
  } else {
    let updated = db
      .update(
        Table::Offers,
        &[Filter::eq("id", offer_id), Filter::eq("status", OfferStatus::Pending.as_str())],
        json!({ "status": OfferStatus::Rejected }),
      )
      .await
      .map_err(|e| remote_error(e, "Could not reject offer"))?;
    let rejected: Vec<Offer> = decode_rows(updated)?;
    if rejected.is_empty() {
      return Err(AppError::Conflict("This offer has already been answered".to_string()));
    }
    info!(%offer_id, "Offer rejected.");
  }
  Ok(Flow::Continue)
}

async fn notify_buyer(ctx: Shared<RespondOfferCtx>) -> Result<Flow> {
  let (db, offer, accept) = ctx.with(|c| (Arc::clone(&c.app_state.db), c.offer.clone(), c.accept));
  if let Some(offer) = offer {
    let message = if accept {
      format!("Your offer of {:.2} was accepted. Complete checkout to secure the item", offer.amount)
    } else {
      format!("Your offer of {:.2} was declined", offer.amount)
    };
    let link = format!("/items/{}", offer.item_id);
    notify_or_warn(db.as_ref(), offer.buyer_id, NotificationKind::Offer, &message, Some(&link)).await;
  }
  Ok(Flow::Continue)
}
