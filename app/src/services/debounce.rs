// noskem/src/services/debounce.rs

//! Per-key trailing-edge debounce on the tokio timer.
//!
//! `push(key, value)` restarts the key's window. When a window closes
//! without another push, the sink receives the last value pushed for that
//! key. Keys never delay one another.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Sink<K, V> = Arc<dyn Fn(K, V) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<V> {
  generation: u64,
  value: V,
  timer: JoinHandle<()>,
}

pub struct KeyedDebouncer<K, V> {
  window: Duration,
  pending: Arc<Mutex<HashMap<K, Pending<V>>>>,
  next_generation: Arc<AtomicU64>,
  sink: Sink<K, V>,
}

impl<K, V> Clone for KeyedDebouncer<K, V> {
  fn clone(&self) -> Self {
    Self {
      window: self.window,
      pending: Arc::clone(&self.pending),
      next_generation: Arc::clone(&self.next_generation),
      sink: Arc::clone(&self.sink),
    }
  }
}

impl<K, V> KeyedDebouncer<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + 'static,
{
  pub fn new<F, Fut>(window: Duration, sink: F) -> Self
  where
    F: Fn(K, V) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    Self {
      window,
      pending: Arc::new(Mutex::new(HashMap::new())),
      next_generation: Arc::new(AtomicU64::new(0)),
      sink: Arc::new(move |k, v| -> BoxFuture<'static, ()> { Box::pin(sink(k, v)) }),
    }
  }

  /// Must be called from within a tokio runtime.
  pub fn push(&self, key: K, value: V) {
    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

    // The timer task takes this lock after sleeping, so it always sees the new entry.
    let mut map = self.pending.lock();
    let timer = {
      let pending = Arc::clone(&self.pending);
      let sink = Arc::clone(&self.sink);
      let window = self.window;
      let key = key.clone();
      tokio::spawn(async move {
        tokio::time::sleep(window).await;
        let fired = {
          let mut map = pending.lock();
          match map.get(&key) {
            Some(p) if p.generation == generation => map.remove(&key).map(|p| p.value),
            _ => None,
          }
        };
        if let Some(value) = fired {
          sink(key, value).await;
        }
      })
    };
    let replaced = map.insert(
      key,
      Pending {
        generation,
        value,
        timer,
      },
    );
    if let Some(old) = replaced {
      old.timer.abort();
    }
  }

  /// Keys with a window still open.
  pub fn pending(&self) -> usize {
    self.pending.lock().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn recording(window: Duration) -> (KeyedDebouncer<&'static str, u32>, Arc<Mutex<Vec<(&'static str, u32)>>>) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink_log = Arc::clone(&fired);
    let debouncer = KeyedDebouncer::new(window, move |k, v| {
      let log = Arc::clone(&sink_log);
      async move { log.lock().push((k, v)) }
    });
    (debouncer, fired)
  }

  #[tokio::test(start_paused = true)]
  async fn burst_fires_once_with_last_value() {
    let (debouncer, fired) = recording(Duration::from_millis(1000));
    for v in 1..=5 {
      debouncer.push("search-1", v);
      tokio::time::sleep(Duration::from_millis(300)).await;
    }
    assert!(fired.lock().is_empty());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(*fired.lock(), vec![("search-1", 5)]);
    assert_eq!(debouncer.pending(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn keys_are_independent() {
    let (debouncer, fired) = recording(Duration::from_millis(500));
    debouncer.push("a", 1);
    tokio::time::sleep(Duration::from_millis(200)).await;
    debouncer.push("b", 2);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(*fired.lock(), vec![("a", 1)]);

    debouncer.push("a", 3);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(*fired.lock(), vec![("a", 1), ("b", 2), ("a", 3)]);
  }

  #[tokio::test(start_paused = true)]
  async fn pushes_spaced_beyond_the_window_each_fire() {
    let (debouncer, fired) = recording(Duration::from_millis(100));
    debouncer.push("k", 1);
    tokio::time::sleep(Duration::from_millis(150)).await;
    debouncer.push("k", 2);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(*fired.lock(), vec![("k", 1), ("k", 2)]);
  }
}
