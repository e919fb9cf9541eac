// noskem/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  PendingPayment,
  Paid,
  AwaitingInspection,
  InspectionPassed,
  InspectionFailed,
  InTransit,
  Delivered,
  Completed,
  Disputed,
  Cancelled,
  Refunded,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::PendingPayment => "pending_payment",
      OrderStatus::Paid => "paid",
      OrderStatus::AwaitingInspection => "awaiting_inspection",
      OrderStatus::InspectionPassed => "inspection_passed",
      OrderStatus::InspectionFailed => "inspection_failed",
      OrderStatus::InTransit => "in_transit",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Completed => "completed",
      OrderStatus::Disputed => "disputed",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub item_id: Uuid,
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  #[serde(default)]
  pub offer_id: Option<Uuid>,
  #[serde(default)]
  pub agent_id: Option<Uuid>,
  pub status: OrderStatus,
  pub total_amount: f64,
  #[serde(default)]
  pub commission_amount: Option<f64>,
  #[serde(default)]
  pub payment_reference: Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
  pub fn is_party(&self, user_id: Uuid) -> bool {
    self.buyer_id == user_id || self.seller_id == user_id
  }

  /// The other side of the trade from `user_id`'s point of view.
  pub fn counterparty(&self, user_id: Uuid) -> Uuid {
    if self.buyer_id == user_id {
      self.seller_id
    } else {
      self.buyer_id
    }
  }
}
