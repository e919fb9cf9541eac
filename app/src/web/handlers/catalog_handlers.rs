// noskem/src/web/handlers/catalog_handlers.rs

//! Public catalog pages. Responses are cached until a write revalidates them.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{fetch_page, read_failed};
use crate::db::{decode_row, decode_rows, Filter, Select, Table};
use crate::errors::{AppError, Result};
use crate::models::{Category, Item, ItemStatus, Profile, Review};
use crate::state::AppState;
use crate::web::auth::MaybeUser;
use crate::web::guest_likes::GuestLikes;
use crate::web::pagination::PageQuery;

pub async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn cache_key(req: &HttpRequest) -> String {
  match req.query_string() {
    "" => req.path().to_string(),
    qs => format!("{}?{}", req.path(), qs),
  }
}

fn cached(state: &AppState, key: &str) -> Option<HttpResponse> {
  let body = state.page_cache.get(key)?;
  debug!(%key, "Serving cached page.");
  Some(HttpResponse::Ok().json(body))
}

fn store(state: &AppState, key: String, body: Value) -> HttpResponse {
  let response = HttpResponse::Ok().json(&body);
  state.page_cache.put(key, body);
  response
}

#[instrument(name = "handler::list_categories", skip(app_state, req))]
pub async fn list_categories_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
  let key = cache_key(&req);
  if let Some(hit) = cached(&app_state, &key) {
    return Ok(hit);
  }

  const MESSAGE: &str = "Could not load categories";
  let rows = app_state
    .db
    .select(&Select::table(Table::Categories).order_by("name", false))
    .await
    .map_err(read_failed(MESSAGE))?;
  let categories: Vec<Category> = decode_rows(rows.rows).map_err(read_failed(MESSAGE))?;
  Ok(store(&app_state, key, json!({ "categories": categories })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
  pub q: Option<String>,
  pub category: Option<Uuid>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub page: Option<i64>,
  pub per_page: Option<i64>,
}

impl ItemsQuery {
  /// Available items matching the filters, newest first.
  pub fn to_select(&self) -> Select {
    let mut query = Select::table(Table::Items).eq("status", ItemStatus::Available.as_str());
    if let Some(needle) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
      query = query.filter(Filter::Or(vec![
        Filter::contains("title", needle),
        Filter::contains("description", needle),
      ]));
    }
    if let Some(category) = self.category {
      query = query.eq("category_id", category);
    }
    if let Some(min) = self.min_price.filter(|p| p.is_finite()) {
      query = query.filter(Filter::Gte("price", min));
    }
    if let Some(max) = self.max_price.filter(|p| p.is_finite()) {
      query = query.filter(Filter::Lte("price", max));
    }
    query.newest_first()
  }
}

#[instrument(name = "handler::list_items", skip(app_state, req, query))]
pub async fn list_items_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  query: web::Query<ItemsQuery>,
) -> Result<HttpResponse> {
  let key = cache_key(&req);
  if let Some(hit) = cached(&app_state, &key) {
    return Ok(hit);
  }

  let page = PageQuery {
    page: query.page,
    per_page: query.per_page,
  }
  .resolve();
  let items = fetch_page::<Item>(app_state.db.as_ref(), query.to_select(), page, "Could not load items").await?;
  info!(count = items.items.len(), total = items.total, "Items listed.");
  let body = serde_json::to_value(&items).map_err(|e| AppError::Internal(e.to_string()))?;
  Ok(store(&app_state, key, body))
}

struct ItemPage {
  body: Value,
  /// Set when only this seller may see the page.
  owner_only: Option<Uuid>,
}

/// Item page body shared by every viewer. Only public items are cached.
async fn item_page(app_state: &AppState, key: String, item_id: Uuid) -> Result<ItemPage> {
  if let Some(hit) = app_state.page_cache.get(&key) {
    debug!(%key, "Serving cached page.");
    return Ok(ItemPage {
      body: hit,
      owner_only: None,
    });
  }

  const MESSAGE: &str = "Could not load item";
  let db = app_state.db.as_ref();

  let row = db
    .select(&Select::table(Table::Items).eq("id", item_id).limit(1))
    .await
    .map_err(read_failed(MESSAGE))?
    .first()
    .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
  let item: Item = decode_row(row).map_err(read_failed(MESSAGE))?;

  let seller: Option<Profile> = match db
    .select(&Select::table(Table::Profiles).eq("id", item.seller_id).limit(1))
    .await
    .map_err(read_failed(MESSAGE))?
    .first()
  {
    Some(row) => Some(decode_row(row).map_err(read_failed(MESSAGE))?),
    None => None,
  };

  let reviews = db
    .select(
      &Select::table(Table::Reviews)
        .eq("reviewee_id", item.seller_id)
        .newest_first()
        .limit(5),
    )
    .await
    .map_err(read_failed(MESSAGE))?;
  let review_count = reviews.total;
  let recent: Vec<Review> = decode_rows(reviews.rows).map_err(read_failed(MESSAGE))?;

  let body = json!({
    "item": item,
    "seller": seller,
    "reviews": {
      "count": review_count,
      "average": seller.as_ref().and_then(|s| s.rating_average),
      "recent": recent,
    },
  });
  if !item.status.is_public() {
    return Ok(ItemPage {
      body,
      owner_only: Some(item.seller_id),
    });
  }
  app_state.page_cache.put(key, body.clone());
  Ok(ItemPage {
    body,
    owner_only: None,
  })
}

/// The item, its seller and review summary, plus whether the viewer liked it.
/// Signed-in likes come from the store; a guest's from their cookie.
/// Pending and archived listings answer 404 to anyone but their seller.
#[instrument(name = "handler::get_item", skip(app_state, req, viewer, path), fields(item_id = %path.as_ref()))]
pub async fn get_item_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  viewer: MaybeUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let item_id = path.into_inner();
  let ItemPage { mut body, owner_only } = item_page(&app_state, cache_key(&req), item_id).await?;
  if let Some(owner) = owner_only {
    if viewer.0.as_ref().map(|u| u.user_id) != Some(owner) {
      return Err(AppError::NotFound("Item not found".to_string()));
    }
  }

  let liked = match viewer.0 {
    Some(user) => {
      let likes = app_state
        .db
        .select(&Select::table(Table::Likes).eq("user_id", user.user_id).eq("item_id", item_id).limit(1))
        .await
        .map_err(read_failed("Could not load item"))?;
      !likes.rows.is_empty()
    }
    None => GuestLikes::from_request(&req).contains(item_id),
  };
  if let Some(obj) = body.as_object_mut() {
    obj.insert("liked".to_string(), Value::Bool(liked));
  }
  Ok(HttpResponse::Ok().json(body))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn items_query_filters_only_what_is_given() {
    let bare = ItemsQuery::default().to_select();
    assert_eq!(bare.filters, vec![Filter::Eq("status", "available".to_string())]);

    let category = Uuid::new_v4();
    let full = ItemsQuery {
      q: Some("  lamp ".to_string()),
      category: Some(category),
      min_price: Some(10.0),
      max_price: Some(f64::NAN),
      ..Default::default()
    }
    .to_select();
    assert_eq!(
      full.filters,
      vec![
        Filter::Eq("status", "available".to_string()),
        Filter::Or(vec![Filter::contains("title", "lamp"), Filter::contains("description", "lamp")]),
        Filter::Eq("category_id", category.to_string()),
        Filter::Gte("price", 10.0),
      ]
    );
  }
}
