// noskem/src/models/provider.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProvider {
  pub id: Uuid,
  pub user_id: Uuid,
  pub business_name: String,
  pub service_type: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub phone_number: Option<String>,
  #[serde(default)]
  pub location_text: Option<String>,
  #[serde(default)]
  pub is_verified: bool,
  pub created_at: DateTime<Utc>,
}
