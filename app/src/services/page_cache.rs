// noskem/src/services/page_cache.rs

//! Cached JSON read responses, keyed by path plus query string.
//!
//! Write actions call [`PageCache::revalidate`] with the paths they made
//! stale. Every entry whose key starts with one of those paths is dropped.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub struct PageCache {
  ttl: Duration,
  entries: RwLock<HashMap<String, (Instant, Value)>>,
}

impl PageCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: RwLock::new(HashMap::new()),
    }
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    let entries = self.entries.read();
    let (stored_at, value) = entries.get(key)?;
    (stored_at.elapsed() < self.ttl).then(|| value.clone())
  }

  pub fn put(&self, key: impl Into<String>, value: Value) {
    if self.ttl.is_zero() {
      return;
    }
    let mut entries = self.entries.write();
    entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
    entries.insert(key.into(), (Instant::now(), value));
  }

  /// Drops every entry under any of `paths`. Returns how many were dropped.
  pub fn revalidate(&self, paths: &[&str]) -> usize {
    let mut entries = self.entries.write();
    let before = entries.len();
    entries.retain(|key, _| !paths.iter().any(|p| key.starts_with(p)));
    let dropped = before - entries.len();
    debug!(?paths, dropped, "Page cache revalidated.");
    dropped
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
