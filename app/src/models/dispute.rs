// noskem/src/models/dispute.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeMessage {
  pub id: Uuid,
  pub order_id: Uuid,
  pub sender_id: Uuid,
  pub message: String,
  pub created_at: DateTime<Utc>,
}
