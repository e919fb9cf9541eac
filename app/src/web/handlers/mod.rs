// noskem/src/web/handlers/mod.rs

pub mod account_handlers;
pub mod agent_handlers;
pub mod catalog_handlers;
pub mod engagement_handlers;
pub mod listing_handlers;
pub mod offer_handlers;
pub mod order_handlers;
pub mod provider_handlers;
pub mod webhook_handlers;

use crate::db::{decode_rows, DbError, RemoteDb, Select};
use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::pagination::{PageRequest, Paginated};
use noskem_core::{Outcome, Shared};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

/// Maps a failed read to the page's fixed message, logging the cause.
pub(crate) fn read_failed(message: &'static str) -> impl FnOnce(DbError) -> AppError {
  move |err| {
    error!(error = %err, "{}", message);
    AppError::ReadFailed(message)
  }
}

/// One page of `query`, newest-first ordering left to the caller.
pub(crate) async fn fetch_page<T: DeserializeOwned>(
  db: &dyn RemoteDb,
  query: Select,
  page: PageRequest,
  message: &'static str,
) -> Result<Paginated<T>> {
  let rows = db
    .select(&query.range(page.offset(), page.per_page))
    .await
    .map_err(read_failed(message))?;
  let items = decode_rows(rows.rows).map_err(read_failed(message))?;
  Ok(Paginated::new(items, page, rows.total))
}

/// Runs the pipeline registered for `T`. A halted run is not expected from any action.
pub(crate) async fn run_action<T: Send + Sync + 'static>(state: &AppState, ctx: &Shared<T>) -> Result<()> {
  match state.registry.run(ctx.clone()).await? {
    Outcome::Completed => Ok(()),
    Outcome::Halted => {
      warn!(context = std::any::type_name::<T>(), "Action pipeline halted before completing.");
      Err(AppError::Internal("The action did not complete".to_string()))
    }
  }
}
