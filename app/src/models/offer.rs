// noskem/src/models/offer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
  Pending,
  Accepted,
  Rejected,
  Withdrawn,
  Expired,
}

impl OfferStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OfferStatus::Pending => "pending",
      OfferStatus::Accepted => "accepted",
      OfferStatus::Rejected => "rejected",
      OfferStatus::Withdrawn => "withdrawn",
      OfferStatus::Expired => "expired",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
  pub id: Uuid,
  pub item_id: Uuid,
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub amount: f64,
  pub status: OfferStatus,
  #[serde(default)]
  pub message: Option<String>,
  pub created_at: DateTime<Utc>,
}
