// noskem/src/services/paystack.rs

//! Paystack client: transaction initialization and verification.
//!
//! The marketplace only starts checkouts and looks them up. Crediting an
//! order happens when the signed `charge.success` webhook arrives.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentMetadata {
  pub order_id: Uuid,
  pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InitializeTransaction {
  pub email: String,
  /// Amount in the currency's minor unit (kobo for NGN).
  pub amount: u64,
  pub currency: String,
  pub reference: String,
  pub callback_url: String,
  pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Authorization {
  pub authorization_url: String,
  pub access_code: String,
  pub reference: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Verification {
  /// `success`, `failed`, `abandoned`, ...
  pub status: String,
  pub reference: String,
  pub amount: u64,
  #[serde(default)]
  pub currency: Option<String>,
}

impl Verification {
  pub fn succeeded(&self) -> bool {
    self.status == "success"
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn initialize(&self, request: &InitializeTransaction) -> Result<Authorization>;
  async fn verify(&self, reference: &str) -> Result<Verification>;
}

/// Every Paystack response carries this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
  status: bool,
  #[serde(default)]
  message: String,
  data: Option<T>,
}

/// Major units to minor units, rounded to the nearest minor unit.
pub fn to_minor_units(amount: f64) -> Result<u64> {
  let minor = (amount * 100.0).round();
  if !minor.is_finite() || minor <= 0.0 {
    return Err(AppError::Validation("Amount must be greater than zero".to_string()));
  }
  Ok(minor as u64)
}

pub fn new_reference() -> String {
  format!("nsk_{}", Uuid::new_v4().simple())
}

#[derive(Clone)]
pub struct PaystackClient {
  http: reqwest::Client,
  base_url: String,
  secret_key: String,
}

impl PaystackClient {
  pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(&config.paystack_base_url, &config.paystack_secret_key)
  }

  async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    let envelope: Option<Envelope<T>> = serde_json::from_str(&body).ok();
    match envelope {
      Some(Envelope {
        status: true,
        data: Some(data),
        ..
      }) if status.is_success() => Ok(data),
      Some(env) => {
        warn!(http_status = %status, message = %env.message, "Paystack refused the request.");
        Err(AppError::Payment(if env.message.is_empty() {
          format!("Paystack responded with {}", status)
        } else {
          env.message
        }))
      }
      None if status == StatusCode::UNAUTHORIZED => Err(AppError::Payment("Paystack rejected the secret key".to_string())),
      None => Err(AppError::Payment(format!("Unexpected Paystack response ({})", status))),
    }
  }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
  #[instrument(
    name = "paystack::initialize",
    skip(self, request),
    fields(reference = %request.reference, order_id = %request.metadata.order_id, amount = request.amount),
    err(Display)
  )]
  async fn initialize(&self, request: &InitializeTransaction) -> Result<Authorization> {
    let response = self
      .http
      .post(format!("{}/transaction/initialize", self.base_url))
      .bearer_auth(&self.secret_key)
      .json(request)
      .send()
      .await?;
    let authorization: Authorization = Self::unwrap_envelope(response).await?;
    info!("Paystack transaction initialized.");
    Ok(authorization)
  }

  #[instrument(name = "paystack::verify", skip(self), err(Display))]
  async fn verify(&self, reference: &str) -> Result<Verification> {
    let response = self
      .http
      .get(format!("{}/transaction/verify/{}", self.base_url, reference))
      .bearer_auth(&self.secret_key)
      .send()
      .await?;
    Self::unwrap_envelope(response).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minor_units_round_to_the_nearest_kobo() {
    assert_eq!(to_minor_units(1500.0).unwrap(), 150_000);
    assert_eq!(to_minor_units(19.99).unwrap(), 1_999);
    assert_eq!(to_minor_units(0.005).unwrap(), 1);
  }

  #[test]
  fn non_positive_amounts_are_rejected() {
    for bad in [0.0, -5.0, 0.004, f64::NAN, f64::INFINITY] {
      assert!(matches!(to_minor_units(bad), Err(AppError::Validation(_))), "{bad}");
    }
  }

  #[test]
  fn references_are_unique() {
    assert_ne!(new_reference(), new_reference());
    assert!(new_reference().starts_with("nsk_"));
  }
}
