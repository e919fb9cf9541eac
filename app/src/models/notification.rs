// noskem/src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  Offer,
  Order,
  Payment,
  Inspection,
  Dispute,
  Review,
  SavedSearch,
  System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub id: Uuid,
  pub user_id: Uuid,
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  pub message: String,
  #[serde(default)]
  pub link: Option<String>,
  #[serde(default)]
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}
