// noskem/src/web/handlers/provider_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::fetch_page;
use crate::db::{decode_row, Select, Table};
use crate::errors::{AppError, Result};
use crate::models::ServiceProvider;
use crate::pipelines::common_steps::remote_error;
use crate::pipelines::validation;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;
use crate::web::pagination::PageQuery;

#[instrument(name = "handler::list_providers", skip(app_state, page))]
pub async fn list_providers_handler(
  app_state: web::Data<AppState>,
  page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
  let query = Select::table(Table::ServiceProviders)
    .eq("is_verified", true)
    .order_by("business_name", false);
  let providers = fetch_page::<ServiceProvider>(
    app_state.db.as_ref(),
    query,
    page.into_inner().resolve(),
    "Could not load service providers",
  )
  .await?;
  Ok(HttpResponse::Ok().json(providers))
}

#[derive(Debug, Deserialize)]
pub struct RegisterProviderRequest {
  pub business_name: String,
  pub service_type: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub phone_number: Option<String>,
  #[serde(default)]
  pub location_text: Option<String>,
}

impl RegisterProviderRequest {
  pub fn validate(&self) -> Result<()> {
    let name_len = self.business_name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
      return Err(AppError::Validation("Business name must be between 2 and 100 characters".to_string()));
    }
    if self.service_type.trim().is_empty() {
      return Err(AppError::Validation("Choose a service type".to_string()));
    }
    if let Some(description) = &self.description {
      validation::description(description)?;
    }
    if let Some(phone) = self.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
      validation::phone(phone)?;
    }
    Ok(())
  }
}

/// New providers start unverified and stay off the public list until an admin verifies them.
#[instrument(name = "handler::register_provider", skip(app_state, auth_user, body), fields(user_id = %auth_user.user_id))]
pub async fn register_provider_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<RegisterProviderRequest>,
) -> Result<HttpResponse> {
  body.validate()?;
  let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
  let row = app_state
    .db
    .insert(
      Table::ServiceProviders,
      json!({
        "user_id": auth_user.user_id,
        "business_name": body.business_name.trim(),
        "service_type": body.service_type.trim(),
        "description": trimmed(&body.description),
        "phone_number": trimmed(&body.phone_number),
        "location_text": trimmed(&body.location_text),
        "is_verified": false,
      }),
    )
    .await
    .map_err(|e| remote_error(e, "Could not register provider"))?;
  let provider: ServiceProvider = decode_row(row)?;
  info!(provider_id = %provider.id, "Service provider registered.");
  Ok(HttpResponse::Created().json(provider))
}
