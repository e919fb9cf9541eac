// tests/offer_tests.rs
mod common;
use common::*;

use actix_web::{http::StatusCode, test};
use chrono::Utc;
use noskem::db::{Rpc, Table};
use serde_json::{json, Value};
use uuid::Uuid;

fn offer_row(id: Uuid, item_id: Uuid, buyer_id: Uuid, seller_id: Uuid, status: &str) -> Value {
  json!({
    "id": id,
    "item_id": item_id,
    "buyer_id": buyer_id,
    "seller_id": seller_id,
    "amount": 180.0,
    "status": status,
    "message": null,
    "created_at": Utc::now(),
  })
}

#[actix_web::test]
async fn buyer_offer_is_stored_and_seller_notified() {
  let h = harness();
  let (seller, buyer, item_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  h.db.seed(Table::Items, item_row(item_id, seller, "available", 250.0));
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/items/{}/offers", item_id))
    .insert_header(bearer(buyer))
    .set_json(json!({ "amount": 200.0, "message": "  Can you deliver?  " }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let offer: Value = test::read_body_json(resp).await;
  assert_eq!(offer["status"], "pending");
  assert_eq!(offer["seller_id"], json!(seller));
  assert_eq!(offer["message"], "Can you deliver?");

  let notes = h.db.rows(Table::Notifications);
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0]["user_id"], json!(seller));
  assert_eq!(notes[0]["type"], "offer");
}

#[actix_web::test]
async fn offers_on_own_or_unavailable_items_are_refused() {
  let h = harness();
  let seller = Uuid::new_v4();
  let (own, sold) = (Uuid::new_v4(), Uuid::new_v4());
  h.db.seed(Table::Items, item_row(own, seller, "available", 250.0));
  h.db.seed(Table::Items, item_row(sold, Uuid::new_v4(), "sold", 250.0));
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/items/{}/offers", own))
    .insert_header(bearer(seller))
    .set_json(json!({ "amount": 100.0 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["error"], "You cannot make an offer on your own item");

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/items/{}/offers", sold))
    .insert_header(bearer(Uuid::new_v4()))
    .set_json(json!({ "amount": 100.0 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/items/{}/offers", Uuid::new_v4()))
    .insert_header(bearer(Uuid::new_v4()))
    .set_json(json!({ "amount": 100.0 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  assert!(h.db.rows(Table::Offers).is_empty());
}

#[actix_web::test]
async fn non_positive_offer_fails_before_any_lookup() {
  let h = harness();
  let app = test_app!(h.state);
  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/items/{}/offers", Uuid::new_v4()))
    .insert_header(bearer(Uuid::new_v4()))
    .set_json(json!({ "amount": -5 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
  assert!(h.db.log().is_empty());
}

#[actix_web::test]
async fn seller_accepts_through_the_procedure() {
  let h = harness();
  let (seller, buyer, item_id, offer_id, order_id) =
    (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  h.db.seed(Table::Offers, offer_row(offer_id, item_id, buyer, seller, "pending"));
  h.db.on_rpc("accept_offer", Ok(json!({ "order_id": order_id })));
  let app = test_app!(h.state);

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/offers/{}/respond", offer_id))
    .insert_header(bearer(seller))
    .set_json(json!({ "accept": true }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["status"], "accepted");
  assert_eq!(json["order_id"], json!(order_id));
  assert_eq!(h.db.rpc_calls(), vec![Rpc::AcceptOffer { offer_id, seller_id: seller }]);
  assert_eq!(h.db.rows(Table::Notifications)[0]["user_id"], json!(buyer));
}

#[actix_web::test]
async fn rejection_updates_the_offer_and_only_once() {
  let h = harness();
  let (seller, offer_id) = (Uuid::new_v4(), Uuid::new_v4());
  h.db.seed(Table::Offers, offer_row(offer_id, Uuid::new_v4(), Uuid::new_v4(), seller, "pending"));
  let app = test_app!(h.state);

  let respond = |user: Uuid| {
    test::TestRequest::post()
      .uri(&format!("/api/v1/offers/{}/respond", offer_id))
      .insert_header(bearer(user))
      .set_json(json!({ "accept": false }))
      .to_request()
  };

  assert_eq!(test::call_service(&app, respond(Uuid::new_v4())).await.status(), StatusCode::FORBIDDEN);
  assert_eq!(test::call_service(&app, respond(seller)).await.status(), StatusCode::OK);
  assert_eq!(h.db.rows(Table::Offers)[0]["status"], "rejected");
  assert_eq!(test::call_service(&app, respond(seller)).await.status(), StatusCode::CONFLICT);
  assert!(h.db.rpc_calls().is_empty());
}
