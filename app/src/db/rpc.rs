// noskem/src/db/rpc.rs

//! Stored procedures the application invokes. Commission, escrow, the
//! order-status machine and inspection transitions are implemented inside
//! these procedures; the application supplies arguments and reads back
//! the `jsonb` each one returns.

use crate::models::{ItemCondition, OrderStatus};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Rpc {
  HandleNewItemListing {
    seller_id: Uuid,
    title: String,
    description: String,
    category_id: Uuid,
    price: f64,
    condition: ItemCondition,
    location_text: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    image_urls: Vec<String>,
  },
  CreateOrder {
    item_id: Uuid,
    buyer_id: Uuid,
    offer_id: Option<Uuid>,
  },
  ProcessOrderPayment {
    order_id: Uuid,
    user_id: Uuid,
    reference: String,
  },
  AcceptOffer {
    offer_id: Uuid,
    seller_id: Uuid,
  },
  SubmitInspectionReport {
    order_id: Uuid,
    agent_id: Uuid,
    passed: bool,
    notes: String,
    photo_urls: Vec<String>,
  },
  UpdateOrderStatus {
    order_id: Uuid,
    actor_id: Uuid,
    new_status: OrderStatus,
  },
  ReleaseEscrow {
    order_id: Uuid,
    buyer_id: Uuid,
  },
  OpenDispute {
    order_id: Uuid,
    user_id: Uuid,
    reason: String,
  },
}

impl Rpc {
  pub fn name(&self) -> &'static str {
    match self {
      Rpc::HandleNewItemListing { .. } => "handle_new_item_listing",
      Rpc::CreateOrder { .. } => "create_order",
      Rpc::ProcessOrderPayment { .. } => "process_order_payment",
      Rpc::AcceptOffer { .. } => "accept_offer",
      Rpc::SubmitInspectionReport { .. } => "submit_inspection_report",
      Rpc::UpdateOrderStatus { .. } => "update_order_status",
      Rpc::ReleaseEscrow { .. } => "release_escrow_funds",
      Rpc::OpenDispute { .. } => "open_dispute",
    }
  }

  /// Named arguments in the order they are written into the call.
  pub fn args(&self) -> Vec<(&'static str, RpcArg)> {
    match self {
      Rpc::HandleNewItemListing {
        seller_id,
        title,
        description,
        category_id,
        price,
        condition,
        location_text,
        latitude,
        longitude,
        image_urls,
      } => vec![
        ("p_seller_id", RpcArg::Uuid(Some(*seller_id))),
        ("p_title", RpcArg::Text(Some(title.clone()))),
        ("p_description", RpcArg::Text(Some(description.clone()))),
        ("p_category_id", RpcArg::Uuid(Some(*category_id))),
        ("p_price", RpcArg::Numeric(Some(*price))),
        ("p_condition", RpcArg::Text(Some(condition.as_str().to_string()))),
        ("p_location_text", RpcArg::Text(location_text.clone())),
        ("p_latitude", RpcArg::Numeric(*latitude)),
        ("p_longitude", RpcArg::Numeric(*longitude)),
        ("p_image_urls", RpcArg::TextArray(image_urls.clone())),
      ],
      Rpc::CreateOrder {
        item_id,
        buyer_id,
        offer_id,
      } => vec![
        ("p_item_id", RpcArg::Uuid(Some(*item_id))),
        ("p_buyer_id", RpcArg::Uuid(Some(*buyer_id))),
        ("p_offer_id", RpcArg::Uuid(*offer_id)),
      ],
      Rpc::ProcessOrderPayment {
        order_id,
        user_id,
        reference,
      } => vec![
        ("p_order_id", RpcArg::Uuid(Some(*order_id))),
        ("p_user_id", RpcArg::Uuid(Some(*user_id))),
        ("p_reference", RpcArg::Text(Some(reference.clone()))),
      ],
      Rpc::AcceptOffer { offer_id, seller_id } => vec![
        ("p_offer_id", RpcArg::Uuid(Some(*offer_id))),
        ("p_seller_id", RpcArg::Uuid(Some(*seller_id))),
      ],
      Rpc::SubmitInspectionReport {
        order_id,
        agent_id,
        passed,
        notes,
        photo_urls,
      } => vec![
        ("p_order_id", RpcArg::Uuid(Some(*order_id))),
        ("p_agent_id", RpcArg::Uuid(Some(*agent_id))),
        ("p_passed", RpcArg::Bool(*passed)),
        ("p_notes", RpcArg::Text(Some(notes.clone()))),
        ("p_photo_urls", RpcArg::TextArray(photo_urls.clone())),
      ],
      Rpc::UpdateOrderStatus {
        order_id,
        actor_id,
        new_status,
      } => vec![
        ("p_order_id", RpcArg::Uuid(Some(*order_id))),
        ("p_actor_id", RpcArg::Uuid(Some(*actor_id))),
        ("p_new_status", RpcArg::Text(Some(new_status.as_str().to_string()))),
      ],
      Rpc::ReleaseEscrow { order_id, buyer_id } => vec![
        ("p_order_id", RpcArg::Uuid(Some(*order_id))),
        ("p_buyer_id", RpcArg::Uuid(Some(*buyer_id))),
      ],
      Rpc::OpenDispute {
        order_id,
        user_id,
        reason,
      } => vec![
        ("p_order_id", RpcArg::Uuid(Some(*order_id))),
        ("p_user_id", RpcArg::Uuid(Some(*user_id))),
        ("p_reason", RpcArg::Text(Some(reason.clone()))),
      ],
    }
  }
}

/// One bound procedure argument. `None` binds SQL `NULL` of the cast type.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcArg {
  Uuid(Option<Uuid>),
  Text(Option<String>),
  Numeric(Option<f64>),
  Bool(bool),
  TextArray(Vec<String>),
}

impl RpcArg {
  /// Explicit cast so the procedure resolves by name without type inference.
  pub fn cast(&self) -> &'static str {
    match self {
      RpcArg::Uuid(_) => "uuid",
      RpcArg::Text(_) => "text",
      RpcArg::Numeric(_) => "numeric",
      RpcArg::Bool(_) => "boolean",
      RpcArg::TextArray(_) => "text[]",
    }
  }
}
