// noskem/src/main.rs

use noskem::config::AppConfig;
use noskem::db::PgRemote;
use noskem::services::paystack::PaystackClient;
use noskem::services::storage::StorageClient;
use noskem::state::AppState;
use noskem::web::configure_app_routes;

use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Largest accepted JSON body. Listing forms carry up to eight hex-encoded images.
const JSON_BODY_LIMIT: usize = 96 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  noskem::init_tracing();
  tracing::info!("Starting Noskem server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let pool = match PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(&app_config.database_url)
    .await
  {
    Ok(pool) => {
      tracing::info!("Connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string()));
    }
  };

  let app_state = AppState::new(
    Arc::clone(&app_config),
    Arc::new(PgRemote::new(pool)),
    Arc::new(PaystackClient::from_config(&app_config)),
    Arc::new(StorageClient::from_config(&app_config)),
  );

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .app_data(web::JsonConfig::default().limit(JSON_BODY_LIMIT))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
