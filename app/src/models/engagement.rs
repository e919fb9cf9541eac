// noskem/src/models/engagement.rs

//! Rows a signed-in user creates for themselves: likes and saved searches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
  pub user_id: Uuid,
  pub item_id: Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSearch {
  pub id: Uuid,
  pub user_id: Uuid,
  pub query: String,
  #[serde(default)]
  pub category_id: Option<Uuid>,
  #[serde(default)]
  pub max_price: Option<f64>,
  pub created_at: DateTime<Utc>,
}
