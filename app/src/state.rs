// noskem/src/state.rs

use crate::config::AppConfig;
use crate::db::RemoteDb;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::alerts::{search_alerts, SearchAlerts};
use crate::services::page_cache::PageCache;
use crate::services::paystack::PaymentGateway;
use crate::services::storage::ObjectStorage;
use noskem_core::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db: Arc<dyn RemoteDb>,
  pub payments: Arc<dyn PaymentGateway>,
  pub storage: Arc<dyn ObjectStorage>,
  pub registry: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
  pub page_cache: Arc<PageCache>,
  pub alerts: SearchAlerts,
}

impl AppState {
  /// Wires the shared services and registers every action pipeline.
  pub fn new(
    config: Arc<AppConfig>,
    db: Arc<dyn RemoteDb>,
    payments: Arc<dyn PaymentGateway>,
    storage: Arc<dyn ObjectStorage>,
  ) -> Self {
    let registry = Arc::new(Registry::<AppError>::new());
    pipelines::register_all_pipelines(&registry);

    Self {
      alerts: search_alerts(Arc::clone(&db), config.search_alert_debounce),
      page_cache: Arc::new(PageCache::new(config.page_cache_ttl)),
      db,
      payments,
      storage,
      registry,
      config,
    }
  }
}
