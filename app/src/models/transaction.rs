// noskem/src/models/transaction.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger line written by the escrow procedures; read-only to the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTransaction {
  pub id: Uuid,
  pub user_id: Uuid,
  #[serde(default)]
  pub order_id: Option<Uuid>,
  #[serde(rename = "type")]
  pub kind: String,
  pub amount: f64,
  pub status: String,
  #[serde(default)]
  pub reference: Option<String>,
  pub created_at: DateTime<Utc>,
}
