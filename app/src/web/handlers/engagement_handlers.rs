// noskem/src/web/handlers/engagement_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::{Filter, Select, Table};
use crate::errors::Result;
use crate::pipelines::common_steps::remote_error;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;
use crate::web::guest_likes::GuestLikes;

fn like_filters(user_id: Uuid, item_id: Uuid) -> [Filter; 2] {
  [Filter::eq("user_id", user_id), Filter::eq("item_id", item_id)]
}

/// Liking twice leaves one row.
#[instrument(name = "handler::like_item", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn like_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let item_id = path.into_inner();
  let db = app_state.db.as_ref();
  let existing = db
    .select(&Select::table(Table::Likes).eq("user_id", auth_user.user_id).eq("item_id", item_id).limit(1))
    .await?;
  if existing.rows.is_empty() {
    db.insert(Table::Likes, json!({ "user_id": auth_user.user_id, "item_id": item_id }))
      .await
      .map_err(|e| remote_error(e, "Could not like item"))?;
  } else {
    debug!(%item_id, "Item already liked.");
  }
  Ok(HttpResponse::Ok().json(json!({ "item_id": item_id, "liked": true })))
}

#[instrument(name = "handler::unlike_item", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn unlike_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let item_id = path.into_inner();
  app_state
    .db
    .delete(Table::Likes, &like_filters(auth_user.user_id, item_id))
    .await
    .map_err(|e| remote_error(e, "Could not remove like"))?;
  Ok(HttpResponse::Ok().json(json!({ "item_id": item_id, "liked": false })))
}

fn guest_likes_response(likes: &GuestLikes) -> HttpResponse {
  HttpResponse::Ok()
    .cookie(likes.to_cookie())
    .json(json!({ "likes": likes.ids() }))
}

pub async fn list_guest_likes_handler(req: HttpRequest) -> HttpResponse {
  let likes = GuestLikes::from_request(&req);
  HttpResponse::Ok().json(json!({ "likes": likes.ids() }))
}

pub async fn add_guest_like_handler(req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
  let mut likes = GuestLikes::from_request(&req);
  likes.add(path.into_inner());
  guest_likes_response(&likes)
}

pub async fn remove_guest_like_handler(req: HttpRequest, path: web::Path<Uuid>) -> HttpResponse {
  let mut likes = GuestLikes::from_request(&req);
  likes.remove(path.into_inner());
  guest_likes_response(&likes)
}
