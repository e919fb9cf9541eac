// noskem/src/web/handlers/account_handlers.rs

//! The signed-in user's own pages and settings under `/me`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{fetch_page, read_failed};
use crate::db::{decode_row, Filter, Select, Table};
use crate::errors::{AppError, Result};
use crate::models::{FinancialTransaction, Item, Notification, Offer, Order, Profile, SavedSearch};
use crate::pipelines::common_steps::remote_error;
use crate::pipelines::validation;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;
use crate::web::pagination::PageQuery;

#[instrument(name = "handler::my_items", skip(app_state, auth_user, page), fields(user_id = %auth_user.user_id))]
pub async fn my_items_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
  let query = Select::table(Table::Items).eq("seller_id", auth_user.user_id).newest_first();
  let items = fetch_page::<Item>(app_state.db.as_ref(), query, page.into_inner().resolve(), "Could not load your listings").await?;
  Ok(HttpResponse::Ok().json(items))
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderRole {
  Buyer,
  Seller,
}

#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
  pub role: Option<OrderRole>,
  pub page: Option<i64>,
  pub per_page: Option<i64>,
}

/// Orders where the user is on the given side, or on either side.
pub fn orders_for(user_id: Uuid, role: Option<OrderRole>) -> Select {
  let query = Select::table(Table::Orders);
  let query = match role {
    Some(OrderRole::Buyer) => query.eq("buyer_id", user_id),
    Some(OrderRole::Seller) => query.eq("seller_id", user_id),
    None => query.filter(Filter::Or(vec![
      Filter::eq("buyer_id", user_id),
      Filter::eq("seller_id", user_id),
    ])),
  };
  query.newest_first()
}

#[instrument(name = "handler::my_orders", skip(app_state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<MyOrdersQuery>,
) -> Result<HttpResponse> {
  let page = PageQuery {
    page: query.page,
    per_page: query.per_page,
  }
  .resolve();
  let select = orders_for(auth_user.user_id, query.role);
  let orders = fetch_page::<Order>(app_state.db.as_ref(), select, page, "Could not load orders").await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferDirection {
  Made,
  Received,
}

#[derive(Debug, Deserialize)]
pub struct MyOffersQuery {
  pub direction: Option<OfferDirection>,
  pub page: Option<i64>,
  pub per_page: Option<i64>,
}

#[instrument(name = "handler::my_offers", skip(app_state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn my_offers_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<MyOffersQuery>,
) -> Result<HttpResponse> {
  let user_id = auth_user.user_id;
  let select = Select::table(Table::Offers);
  let select = match query.direction {
    Some(OfferDirection::Made) => select.eq("buyer_id", user_id),
    Some(OfferDirection::Received) => select.eq("seller_id", user_id),
    None => select.filter(Filter::Or(vec![
      Filter::eq("buyer_id", user_id),
      Filter::eq("seller_id", user_id),
    ])),
  };
  let page = PageQuery {
    page: query.page,
    per_page: query.per_page,
  }
  .resolve();
  let offers = fetch_page::<Offer>(app_state.db.as_ref(), select.newest_first(), page, "Could not load offers").await?;
  Ok(HttpResponse::Ok().json(offers))
}

#[instrument(name = "handler::my_notifications", skip(app_state, auth_user, page), fields(user_id = %auth_user.user_id))]
pub async fn my_notifications_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
  const MESSAGE: &str = "Could not load notifications";
  let db = app_state.db.as_ref();
  let query = Select::table(Table::Notifications).eq("user_id", auth_user.user_id).newest_first();
  let notifications = fetch_page::<Notification>(db, query, page.into_inner().resolve(), MESSAGE).await?;

  // The window count is taken before LIMIT, so one row is enough for the total.
  let unread = db
    .select(
      &Select::table(Table::Notifications)
        .eq("user_id", auth_user.user_id)
        .eq("is_read", false)
        .limit(1),
    )
    .await
    .map_err(read_failed(MESSAGE))?
    .total;

  Ok(HttpResponse::Ok().json(json!({ "notifications": notifications, "unread": unread })))
}

#[instrument(name = "handler::mark_notification_read", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn mark_notification_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let notification_id = path.into_inner();
  let updated = app_state
    .db
    .update(
      Table::Notifications,
      &[
        Filter::eq("id", notification_id),
        Filter::eq("user_id", auth_user.user_id),
      ],
      json!({ "is_read": true }),
    )
    .await
    .map_err(|e| remote_error(e, "Could not update notification"))?;
  if updated.is_empty() {
    return Err(AppError::NotFound("Notification not found".to_string()));
  }
  Ok(HttpResponse::Ok().json(json!({ "id": notification_id, "is_read": true })))
}

#[instrument(name = "handler::mark_all_notifications_read", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn mark_all_notifications_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse> {
  let updated = app_state
    .db
    .update(
      Table::Notifications,
      &[
        Filter::eq("user_id", auth_user.user_id),
        Filter::eq("is_read", false),
      ],
      json!({ "is_read": true }),
    )
    .await
    .map_err(|e| remote_error(e, "Could not update notifications"))?;
  info!(count = updated.len(), "Notifications marked read.");
  Ok(HttpResponse::Ok().json(json!({ "updated": updated.len() })))
}

#[instrument(name = "handler::my_transactions", skip(app_state, auth_user, page), fields(user_id = %auth_user.user_id))]
pub async fn my_transactions_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
  let query = Select::table(Table::FinancialTransactions)
    .eq("user_id", auth_user.user_id)
    .newest_first();
  let transactions = fetch_page::<FinancialTransaction>(
    app_state.db.as_ref(),
    query,
    page.into_inner().resolve(),
    "Could not load transactions",
  )
  .await?;
  Ok(HttpResponse::Ok().json(transactions))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
  pub username: Option<String>,
  pub full_name: Option<String>,
  pub phone_number: Option<String>,
  pub location_text: Option<String>,
}

impl UpdateProfileRequest {
  /// Validated patch holding only the submitted fields. Blank optional fields clear the column.
  pub fn to_patch(&self) -> Result<Value> {
    let mut patch = Map::new();
    if let Some(username) = &self.username {
      let username = username.trim();
      validation::username(username)?;
      patch.insert("username".to_string(), json!(username));
    }
    if let Some(full_name) = &self.full_name {
      let full_name = full_name.trim();
      if full_name.chars().count() > 100 {
        return Err(AppError::Validation("Full name must be 100 characters or fewer".to_string()));
      }
      patch.insert("full_name".to_string(), blank_to_null(full_name));
    }
    if let Some(phone) = &self.phone_number {
      let phone = phone.trim();
      if !phone.is_empty() {
        validation::phone(phone)?;
      }
      patch.insert("phone_number".to_string(), blank_to_null(phone));
    }
    if let Some(location) = &self.location_text {
      let location = location.trim();
      if location.chars().count() > 200 {
        return Err(AppError::Validation("Location must be 200 characters or fewer".to_string()));
      }
      patch.insert("location_text".to_string(), blank_to_null(location));
    }
    if patch.is_empty() {
      return Err(AppError::Validation("Nothing to update".to_string()));
    }
    Ok(Value::Object(patch))
  }
}

fn blank_to_null(value: &str) -> Value {
  if value.is_empty() {
    Value::Null
  } else {
    json!(value)
  }
}

#[instrument(name = "handler::update_profile", skip(app_state, auth_user, body), fields(user_id = %auth_user.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
  let patch = body.to_patch()?;
  let row = app_state
    .db
    .update(Table::Profiles, &[Filter::eq("id", auth_user.user_id)], patch)
    .await
    .map_err(|e| remote_error(e, "Could not update profile"))?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
  let profile: Profile = decode_row(row)?;
  info!("Profile updated.");
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(name = "handler::list_saved_searches", skip(app_state, auth_user, page), fields(user_id = %auth_user.user_id))]
pub async fn list_saved_searches_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
  let query = Select::table(Table::SavedSearches)
    .eq("user_id", auth_user.user_id)
    .newest_first();
  let searches = fetch_page::<SavedSearch>(
    app_state.db.as_ref(),
    query,
    page.into_inner().resolve(),
    "Could not load saved searches",
  )
  .await?;
  Ok(HttpResponse::Ok().json(searches))
}

#[derive(Debug, Deserialize)]
pub struct SaveSearchRequest {
  pub query: String,
  pub category_id: Option<Uuid>,
  pub max_price: Option<f64>,
}

#[instrument(name = "handler::save_search", skip(app_state, auth_user, body), fields(user_id = %auth_user.user_id))]
pub async fn save_search_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<SaveSearchRequest>,
) -> Result<HttpResponse> {
  let query = body.query.trim();
  if query.is_empty() || query.chars().count() > 200 {
    return Err(AppError::Validation("Search text must be 1 to 200 characters".to_string()));
  }
  if let Some(max_price) = body.max_price {
    validation::price(max_price)?;
  }
  let row = app_state
    .db
    .insert(
      Table::SavedSearches,
      json!({
        "user_id": auth_user.user_id,
        "query": query,
        "category_id": body.category_id,
        "max_price": body.max_price,
      }),
    )
    .await
    .map_err(|e| remote_error(e, "Could not save search"))?;
  let saved: SavedSearch = decode_row(row)?;
  info!(search_id = %saved.id, "Search saved.");
  Ok(HttpResponse::Created().json(saved))
}

#[instrument(name = "handler::delete_saved_search", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn delete_saved_search_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let deleted = app_state
    .db
    .delete(
      Table::SavedSearches,
      &[
        Filter::eq("id", path.into_inner()),
        Filter::eq("user_id", auth_user.user_id),
      ],
    )
    .await
    .map_err(|e| remote_error(e, "Could not remove saved search"))?;
  if deleted == 0 {
    return Err(AppError::NotFound("Saved search not found".to_string()));
  }
  Ok(HttpResponse::NoContent().finish())
}
