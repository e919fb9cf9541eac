// tests/checkout_tests.rs
mod common;
use common::*;

use actix_web::{http::StatusCode, test};
use noskem::db::{Rpc, Table};
use serde_json::{json, Value};
use uuid::Uuid;

struct Trade {
  buyer: Uuid,
  item_id: Uuid,
  order_id: Uuid,
}

fn seed_trade(h: &Harness, buyer_email: Option<&str>) -> Trade {
  let (buyer, seller, item_id, order_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  h.db.seed(Table::Profiles, profile_row(buyer, "buyer", buyer_email));
  h.db.seed(Table::Items, item_row(item_id, seller, "available", 250.0));
  h.db.seed(Table::Orders, order_row(order_id, item_id, buyer, seller, "pending_payment"));
  h.db.on_rpc("create_order", Ok(json!({ "id": order_id })));
  Trade { buyer, item_id, order_id }
}

#[actix_web::test]
async fn checkout_creates_order_and_payment_link() {
  let h = harness();
  let trade = seed_trade(&h, Some("ada@example.com"));
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(trade.buyer))
    .set_json(json!({ "item_id": trade.item_id }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["order_id"], json!(trade.order_id));
  let reference = json["reference"].as_str().unwrap().to_string();
  assert!(reference.starts_with("nsk_"));
  assert!(json["authorization_url"].as_str().unwrap().ends_with(&reference));

  assert_eq!(
    h.db.rpc_calls(),
    vec![Rpc::CreateOrder {
      item_id: trade.item_id,
      buyer_id: trade.buyer,
      offer_id: None,
    }]
  );

  let sent = h.gateway.initialized.lock().clone();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].email, "ada@example.com");
  assert_eq!(sent[0].amount, 25_000);
  assert_eq!(sent[0].currency, "NGN");
  assert_eq!(sent[0].metadata.order_id, trade.order_id);
  assert_eq!(sent[0].metadata.user_id, trade.buyer);
  assert_eq!(
    sent[0].callback_url,
    format!("http://localhost:8080/api/v1/orders/{}/payment/callback", trade.order_id)
  );

  assert_eq!(h.db.rows(Table::Orders)[0]["payment_reference"], json!(reference));
}

#[actix_web::test]
async fn unavailable_item_message_comes_from_the_procedure() {
  let h = harness();
  let trade = seed_trade(&h, Some("ada@example.com"));
  h.db.on_rpc("create_order", Err("Item is not available for purchase".to_string()));
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(trade.buyer))
    .set_json(json!({ "item_id": trade.item_id }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["error"], "Item is not available for purchase");
  assert!(h.gateway.initialized.lock().is_empty());
}

#[actix_web::test]
async fn buyer_without_email_cannot_pay() {
  let h = harness();
  let trade = seed_trade(&h, None);
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(trade.buyer))
    .set_json(json!({ "item_id": trade.item_id }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
  assert!(h.gateway.initialized.lock().is_empty());
}

#[actix_web::test]
async fn session_email_stands_in_for_a_missing_profile_email() {
  let h = harness();
  let trade = seed_trade(&h, None);
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer_with_email(trade.buyer, "grace@example.com"))
    .set_json(json!({ "item_id": trade.item_id }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  let sent = h.gateway.initialized.lock().clone();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].email, "grace@example.com");
}

#[actix_web::test]
async fn payment_callback_checks_the_reference() {
  let h = harness();
  let trade = seed_trade(&h, Some("ada@example.com"));
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(trade.buyer))
    .set_json(json!({ "item_id": trade.item_id }))
    .to_request();
  let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
  let reference = created["reference"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}/payment/callback?reference=nsk_other", trade.order_id))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}/payment/callback?reference={}", trade.order_id, reference))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["paid"], true);
  assert_eq!(json["order_status"], "pending_payment");
}
