// noskem/src/services/alerts.rs

//! Saved-search alerts for new listings.
//!
//! A new listing is matched against saved searches and each hit is pushed
//! into a [`KeyedDebouncer`] keyed by saved-search id, so a burst of
//! listings produces one notification per search: the last match.

use crate::db::{decode_rows, Filter, RemoteDb, Select, Table};
use crate::errors::Result;
use crate::models::{NotificationKind, SavedSearch};
use crate::services::debounce::KeyedDebouncer;
use crate::services::notifications::notify_or_warn;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// The parts of a fresh listing a saved search is matched on.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedItem {
  pub id: Uuid,
  pub seller_id: Uuid,
  pub title: String,
  pub description: String,
  pub category_id: Option<Uuid>,
  pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlert {
  pub user_id: Uuid,
  pub query: String,
  pub item_id: Uuid,
  pub item_title: String,
}

pub type SearchAlerts = KeyedDebouncer<Uuid, PendingAlert>;

/// Every query word appears in the title or description (case-insensitive),
/// the category matches when the search names one, and the price is within
/// the search's ceiling when it has one.
pub fn matches(search: &SavedSearch, item: &ListedItem) -> bool {
  let haystack = format!("{} {}", item.title, item.description).to_lowercase();
  let words_match = search
    .query
    .split_whitespace()
    .all(|word| haystack.contains(&word.to_lowercase()));
  let category_matches = match search.category_id {
    Some(wanted) => item.category_id == Some(wanted),
    None => true,
  };
  let price_matches = search.max_price.map_or(true, |max| item.price <= max);
  words_match && category_matches && price_matches
}

/// Debouncer whose sink writes a `saved_search` notification.
pub fn search_alerts(db: Arc<dyn RemoteDb>, window: Duration) -> SearchAlerts {
  KeyedDebouncer::new(window, move |search_id: Uuid, alert: PendingAlert| {
    let db = Arc::clone(&db);
    async move {
      debug!(%search_id, item_id = %alert.item_id, "Saved-search alert firing.");
      let message = format!("New match for \"{}\": {}", alert.query, alert.item_title);
      let link = format!("/items/{}", alert.item_id);
      notify_or_warn(db.as_ref(), alert.user_id, NotificationKind::SavedSearch, &message, Some(&link)).await;
    }
  })
}

/// Pushes an alert for every saved search `item` satisfies. Returns the count.
#[instrument(name = "alerts::queue_matches", skip(db, alerts, item), fields(item_id = %item.id), err(Display))]
pub async fn queue_matches(db: &dyn RemoteDb, alerts: &SearchAlerts, item: &ListedItem) -> Result<usize> {
  let mut query = Select::table(Table::SavedSearches)
    .filter(Filter::Or(vec![
      Filter::IsNull("max_price"),
      Filter::Gte("max_price", item.price),
    ]))
    .filter(Filter::Neq("user_id", item.seller_id.to_string()));
  if let Some(category_id) = item.category_id {
    query = query.filter(Filter::Or(vec![
      Filter::IsNull("category_id"),
      Filter::eq("category_id", category_id),
    ]));
  }

  let searches: Vec<SavedSearch> = decode_rows(db.select(&query).await?.rows)?;
  let mut queued = 0;
  for search in searches.iter().filter(|s| s.user_id != item.seller_id && matches(s, item)) {
    alerts.push(
      search.id,
      PendingAlert {
        user_id: search.user_id,
        query: search.query.clone(),
        item_id: item.id,
        item_title: item.title.clone(),
      },
    );
    queued += 1;
  }
  Ok(queued)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn search(query: &str, category_id: Option<Uuid>, max_price: Option<f64>) -> SavedSearch {
    SavedSearch {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      query: query.to_string(),
      category_id,
      max_price,
      created_at: Utc::now(),
    }
  }

  fn item(category_id: Option<Uuid>, price: f64) -> ListedItem {
    ListedItem {
      id: Uuid::new_v4(),
      seller_id: Uuid::new_v4(),
      title: "Oak Dining Table".to_string(),
      description: "Solid wood, seats six".to_string(),
      category_id,
      price,
    }
  }

  #[test]
  fn every_word_must_appear_somewhere() {
    let it = item(None, 100.0);
    assert!(matches(&search("oak table", None, None), &it));
    assert!(matches(&search("TABLE wood", None, None), &it));
    assert!(!matches(&search("oak chair", None, None), &it));
    assert!(matches(&search("", None, None), &it));
  }

  #[test]
  fn category_and_price_constrain_when_set() {
    let furniture = Uuid::new_v4();
    let it = item(Some(furniture), 250.0);
    assert!(matches(&search("table", Some(furniture), Some(250.0)), &it));
    assert!(!matches(&search("table", Some(Uuid::new_v4()), None), &it));
    assert!(!matches(&search("table", None, Some(249.99)), &it));
    assert!(!matches(&search("table", Some(furniture), None), &item(None, 250.0)));
  }
}
