// noskem/src/models/item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
  PendingInspection,
  Available,
  Reserved,
  Sold,
  Archived,
}

impl ItemStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      ItemStatus::PendingInspection => "pending_inspection",
      ItemStatus::Available => "available",
      ItemStatus::Reserved => "reserved",
      ItemStatus::Sold => "sold",
      ItemStatus::Archived => "archived",
    }
  }

  /// Anyone may open the item page. Pending and archived listings are the seller's alone.
  pub fn is_public(self) -> bool {
    matches!(self, ItemStatus::Available | ItemStatus::Reserved | ItemStatus::Sold)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
  New,
  LikeNew,
  Good,
  Fair,
  Poor,
}

impl ItemCondition {
  pub fn as_str(self) -> &'static str {
    match self {
      ItemCondition::New => "new",
      ItemCondition::LikeNew => "like_new",
      ItemCondition::Good => "good",
      ItemCondition::Fair => "fair",
      ItemCondition::Poor => "poor",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  pub id: Uuid,
  pub seller_id: Uuid,
  pub category_id: Option<Uuid>,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  /// Asking price in major currency units.
  pub price: f64,
  pub condition: ItemCondition,
  pub status: ItemStatus,
  #[serde(default)]
  pub location_text: Option<String>,
  #[serde(default)]
  pub latitude: Option<f64>,
  #[serde(default)]
  pub longitude: Option<f64>,
  #[serde(default)]
  pub image_urls: Vec<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}
