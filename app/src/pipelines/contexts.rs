// noskem/src/pipelines/contexts.rs

//! Context types, one per server action. Handlers receive them wrapped in
//! `noskem_core::Shared`; fields starting out `None` are filled by steps.

use crate::models::{Item, ItemCondition, Offer, Order, OrderStatus};
use crate::services::paystack::Authorization;
use crate::state::AppState;
use actix_web::web::Bytes;
use serde::Deserialize;
use uuid::Uuid;

/// An image sent inline with a form, hex-encoded in JSON.
#[derive(Clone, Deserialize)]
pub struct ImageUpload {
  pub content_type: String,
  #[serde(with = "hex::serde")]
  pub data: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ImageUpload")
      .field("content_type", &self.content_type)
      .field("bytes", &self.data.len())
      .finish()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub category_id: Uuid,
  pub price: f64,
  pub condition: ItemCondition,
  #[serde(default)]
  pub location_text: Option<String>,
  #[serde(default)]
  pub latitude: Option<f64>,
  #[serde(default)]
  pub longitude: Option<f64>,
}

#[derive(Clone)]
pub struct CreateListingCtx {
  pub app_state: AppState,
  pub seller_id: Uuid,
  pub listing: NewListing,
  pub images: Vec<ImageUpload>,
  pub image_urls: Vec<String>,
  pub item_id: Option<Uuid>,
  pub alerts_queued: usize,
}

#[derive(Clone)]
pub struct MakeOfferCtx {
  pub app_state: AppState,
  pub buyer_id: Uuid,
  pub item_id: Uuid,
  pub amount: f64,
  pub message: Option<String>,
  pub item: Option<Item>,
  pub offer: Option<Offer>,
}

#[derive(Clone)]
pub struct RespondOfferCtx {
  pub app_state: AppState,
  pub seller_id: Uuid,
  pub offer_id: Uuid,
  pub accept: bool,
  pub offer: Option<Offer>,
  pub order_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct CheckoutCtx {
  pub app_state: AppState,
  pub buyer_id: Uuid,
  pub item_id: Uuid,
  pub offer_id: Option<Uuid>,
  /// Email claim from the buyer's session, used when the profile has none.
  pub session_email: Option<String>,
  pub order: Option<Order>,
  pub buyer_email: Option<String>,
  pub authorization: Option<Authorization>,
}

/// `charge.success` payload fields the marketplace acts on.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
  pub event: String,
  #[serde(default)]
  pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
  #[serde(default)]
  pub reference: Option<String>,
  #[serde(default)]
  pub metadata: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct PaymentWebhookCtx {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub signature: Option<String>,
  pub event: Option<WebhookEvent>,
  pub order_id: Option<Uuid>,
  pub processed: bool,
}

impl PaymentWebhookCtx {
  pub fn is_charge_success(&self) -> bool {
    self.event.as_ref().is_some_and(|e| e.event == "charge.success")
  }
}

#[derive(Clone)]
pub struct InspectionCtx {
  pub app_state: AppState,
  pub agent_id: Uuid,
  pub order_id: Uuid,
  pub passed: bool,
  pub notes: String,
  pub photos: Vec<ImageUpload>,
  pub photo_urls: Vec<String>,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct OrderStatusCtx {
  pub app_state: AppState,
  pub actor_id: Uuid,
  pub order_id: Uuid,
  pub new_status: OrderStatus,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct ConfirmDeliveryCtx {
  pub app_state: AppState,
  pub buyer_id: Uuid,
  pub order_id: Uuid,
}

#[derive(Clone)]
pub struct ReviewCtx {
  pub app_state: AppState,
  pub reviewer_id: Uuid,
  pub order_id: Uuid,
  pub rating: i32,
  pub comment: Option<String>,
  pub order: Option<Order>,
  pub review_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct OpenDisputeCtx {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub order_id: Uuid,
  pub reason: String,
  pub message_posted: bool,
}

#[derive(Clone)]
pub struct DisputeMessageCtx {
  pub app_state: AppState,
  pub sender_id: Uuid,
  pub order_id: Uuid,
  pub message: String,
  pub order: Option<Order>,
  pub posted: Option<serde_json::Value>,
}
