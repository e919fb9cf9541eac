// noskem/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use noskem_core::Shared;
use serde_json::json;
use tracing::{info, instrument};

use super::run_action;
use crate::errors::Result;
use crate::pipelines::contexts::PaymentWebhookCtx;
use crate::services::webhook_signature::SIGNATURE_HEADER;
use crate::state::AppState;

/// Paystack event delivery. Only `charge.success` changes anything; other
/// events are acknowledged so the gateway does not retry them.
#[instrument(name = "handler::paystack_webhook", skip(app_state, req, body), fields(bytes = body.len()))]
pub async fn paystack_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse> {
  let signature = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);

  let ctx = Shared::new(PaymentWebhookCtx {
    app_state: app_state.get_ref().clone(),
    raw_body: body,
    signature,
    event: None,
    order_id: None,
    processed: false,
  });
  run_action(&app_state, &ctx).await?;

  let (event, order_id, processed) = ctx.with(|c| {
    (
      c.event.as_ref().map(|e| e.event.clone()).unwrap_or_default(),
      c.order_id,
      c.processed,
    )
  });
  if processed {
    info!(?order_id, "Payment webhook processed.");
    Ok(HttpResponse::Ok().json(json!({ "status": "processed" })))
  } else {
    info!(%event, "Webhook event acknowledged without action.");
    Ok(HttpResponse::Ok().json(json!({ "status": "ignored", "event": event })))
  }
}
