// noskem/src/models/profile.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[default]
  Buyer,
  Seller,
  Agent,
  Admin,
}

/// Public face of an auth user. The row id is the auth user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub id: Uuid,
  pub username: Option<String>,
  pub full_name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
  #[serde(default)]
  pub phone_number: Option<String>,
  #[serde(default)]
  pub location_text: Option<String>,
  #[serde(default)]
  pub role: Role,
  #[serde(default)]
  pub rating_average: Option<f64>,
  #[serde(default)]
  pub review_count: i32,
  pub created_at: DateTime<Utc>,
}

impl Profile {
  pub fn display_name(&self) -> &str {
    self
      .full_name
      .as_deref()
      .or(self.username.as_deref())
      .unwrap_or("Noskem user")
  }
}
