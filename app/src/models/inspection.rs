// noskem/src/models/inspection.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionReport {
  pub id: Uuid,
  pub order_id: Uuid,
  pub agent_id: Uuid,
  pub passed: bool,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default)]
  pub photo_urls: Vec<String>,
  pub created_at: DateTime<Utc>,
}
