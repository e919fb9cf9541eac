// noskem/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub app_base_url: String,

  // Hosted auth issues HS256 session tokens signed with this secret.
  pub auth_jwt_secret: String,
  pub auth_jwt_audience: String,

  // Paystack: the same secret key authenticates API calls and signs webhooks.
  pub paystack_secret_key: String,
  pub paystack_base_url: String,
  pub paystack_currency: String,

  pub storage_url: String,
  pub storage_service_key: String,
  pub storage_bucket: String,

  pub page_cache_ttl: Duration,
  pub search_alert_debounce: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let parse_env = |var_name: &str, default: &str| -> Result<u64> {
      get_env(var_name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", "10")? as u32;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let auth_jwt_secret = get_env("AUTH_JWT_SECRET")?;
    let auth_jwt_audience = get_env("AUTH_JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string());

    let paystack_secret_key = get_env("PAYSTACK_SECRET_KEY")?;
    let paystack_base_url = get_env("PAYSTACK_BASE_URL").unwrap_or_else(|_| "https://api.paystack.co".to_string());
    let paystack_currency = get_env("PAYSTACK_CURRENCY").unwrap_or_else(|_| "NGN".to_string());

    let storage_url = get_env("STORAGE_URL")?;
    let storage_service_key = get_env("STORAGE_SERVICE_KEY")?;
    let storage_bucket = get_env("STORAGE_BUCKET").unwrap_or_else(|_| "item-images".to_string());

    let page_cache_ttl = Duration::from_secs(parse_env("PAGE_CACHE_TTL_SECS", "60")?);
    let search_alert_debounce = Duration::from_millis(parse_env("SEARCH_ALERT_DEBOUNCE_MS", "1500")?);

    tracing::info!(%server_host, server_port, %paystack_base_url, %storage_bucket, "Application configuration loaded.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      app_base_url: app_base_url.trim_end_matches('/').to_string(),
      auth_jwt_secret,
      auth_jwt_audience,
      paystack_secret_key,
      paystack_base_url: paystack_base_url.trim_end_matches('/').to_string(),
      paystack_currency,
      storage_url: storage_url.trim_end_matches('/').to_string(),
      storage_service_key,
      storage_bucket,
      page_cache_ttl,
      search_alert_debounce,
    })
  }
}

// Secrets stay out of logs even when the whole config is debug-printed.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("database_max_connections", &self.database_max_connections)
      .field("app_base_url", &self.app_base_url)
      .field("auth_jwt_secret", &"[REDACTED]")
      .field("auth_jwt_audience", &self.auth_jwt_audience)
      .field("paystack_secret_key", &"[REDACTED]")
      .field("paystack_base_url", &self.paystack_base_url)
      .field("paystack_currency", &self.paystack_currency)
      .field("storage_url", &self.storage_url)
      .field("storage_service_key", &"[REDACTED]")
      .field("storage_bucket", &self.storage_bucket)
      .field("page_cache_ttl", &self.page_cache_ttl)
      .field("search_alert_debounce", &self.search_alert_debounce)
      .finish()
  }
}
