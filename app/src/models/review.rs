// noskem/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub id: Uuid,
  pub order_id: Uuid,
  pub reviewer_id: Uuid,
  pub reviewee_id: Uuid,
  pub rating: i32,
  #[serde(default)]
  pub comment: Option<String>,
  pub created_at: DateTime<Utc>,
}
