// tests/webhook_tests.rs
mod common;
use common::*;

use actix_web::{http::StatusCode, test};
use noskem::db::Rpc;
use noskem::services::webhook_signature::{sign, SIGNATURE_HEADER};
use serde_json::{json, Value};
use uuid::Uuid;

fn charge_success(order_id: Uuid, user_id: Uuid, reference: &str) -> Vec<u8> {
  json!({
    "event": "charge.success",
    "data": {
      "reference": reference,
      "amount": 25000,
      "metadata": { "order_id": order_id, "user_id": user_id },
    },
  })
  .to_string()
  .into_bytes()
}

fn webhook(body: Vec<u8>, signature: Option<String>) -> test::TestRequest {
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/paystack")
    .insert_header(("content-type", "application/json"));
  let req = match signature {
    Some(sig) => req.insert_header((SIGNATURE_HEADER, sig)),
    None => req,
  };
  req.set_payload(body)
}

#[actix_web::test]
async fn signed_charge_success_credits_the_order() {
  let h = harness();
  let app = test_app!(h.state);
  let (order_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
  let body = charge_success(order_id, user_id, "nsk_ref_1");
  let sig = sign(PAYSTACK_SECRET, &body);

  let resp = test::call_service(&app, webhook(body, Some(sig)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json, json!({ "status": "processed" }));
  assert_eq!(
    h.db.rpc_calls(),
    vec![Rpc::ProcessOrderPayment {
      order_id,
      user_id,
      reference: "nsk_ref_1".to_string(),
    }]
  );
}

#[actix_web::test]
async fn wrong_signature_is_unauthorized_and_touches_nothing() {
  let h = harness();
  let app = test_app!(h.state);
  let body = charge_success(Uuid::new_v4(), Uuid::new_v4(), "nsk_ref_2");
  let forged = sign("sk_someone_else", &body);

  let resp = test::call_service(&app, webhook(body, Some(forged)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(h.db.log().is_empty());
}

#[actix_web::test]
async fn missing_or_garbled_signature_is_unauthorized() {
  let h = harness();
  let app = test_app!(h.state);
  let body = charge_success(Uuid::new_v4(), Uuid::new_v4(), "nsk_ref_3");

  let resp = test::call_service(&app, webhook(body.clone(), None).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(&app, webhook(body, Some("not-hex".to_string())).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(h.db.rpc_calls().is_empty());
}

#[actix_web::test]
async fn signature_covers_the_exact_bytes() {
  let h = harness();
  let app = test_app!(h.state);
  let body = charge_success(Uuid::new_v4(), Uuid::new_v4(), "nsk_ref_4");
  let sig = sign(PAYSTACK_SECRET, &body);
  let mut tampered = body.clone();
  tampered.push(b' ');

  let resp = test::call_service(&app, webhook(tampered, Some(sig)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn other_events_are_acknowledged_and_ignored() {
  let h = harness();
  let app = test_app!(h.state);
  let body = json!({ "event": "transfer.success", "data": { "reference": "tr_1" } })
    .to_string()
    .into_bytes();
  let sig = sign(PAYSTACK_SECRET, &body);

  let resp = test::call_service(&app, webhook(body, Some(sig)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["status"], "ignored");
  assert!(h.db.rpc_calls().is_empty());
}

#[actix_web::test]
async fn malformed_payload_or_missing_metadata_is_a_bad_request() {
  let h = harness();
  let app = test_app!(h.state);

  let garbage = b"{not json".to_vec();
  let sig = sign(PAYSTACK_SECRET, &garbage);
  let resp = test::call_service(&app, webhook(garbage, Some(sig)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let no_metadata = json!({ "event": "charge.success", "data": { "reference": "r" } })
    .to_string()
    .into_bytes();
  let sig = sign(PAYSTACK_SECRET, &no_metadata);
  let resp = test::call_service(&app, webhook(no_metadata, Some(sig)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(h.db.rpc_calls().is_empty());
}

#[actix_web::test]
async fn procedure_rejection_is_forwarded() {
  let h = harness();
  h.db.on_rpc("process_order_payment", Err("Order is not awaiting payment".to_string()));
  let app = test_app!(h.state);
  let body = charge_success(Uuid::new_v4(), Uuid::new_v4(), "nsk_ref_5");
  let sig = sign(PAYSTACK_SECRET, &body);

  let resp = test::call_service(&app, webhook(body, Some(sig)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["error"], "Order is not awaiting payment");
}
