// tests/common/mod.rs
#![allow(dead_code, unused_macros, unused_imports)]

/// Builds the full route table over `$state` as an actix test service.
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(noskem::web::configure_app_routes),
    )
    .await
  };
}
pub(crate) use test_app;

use async_trait::async_trait;
use chrono::Utc;
use noskem::config::AppConfig;
use noskem::db::{DbError, Filter, RemoteDb, Rows, Rpc, Select, Table};
use noskem::errors::{AppError, Result};
use noskem::services::auth_service::{issue_session_token, issue_session_token_with_email};
use noskem::services::paystack::{Authorization, InitializeTransaction, PaymentGateway, Verification};
use noskem::services::storage::ObjectStorage;
use noskem::state::AppState;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const JWT_AUDIENCE: &str = "authenticated";
pub const PAYSTACK_SECRET: &str = "sk_test_integration";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new("noskem=debug,noskem_core=debug"))
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Column value as the store's `::text` cast would render it.
fn as_text(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

fn matches(row: &Value, filter: &Filter) -> bool {
  let text = |col: &str| row.get(col).and_then(as_text);
  let number = |col: &str| row.get(col).and_then(Value::as_f64);
  match filter {
    Filter::Eq(col, v) => text(*col).as_deref() == Some(v.as_str()),
    Filter::Neq(col, v) => text(*col).is_some_and(|t| t != *v),
    Filter::Ilike(col, pattern) => {
      let needle = pattern.trim_matches('%').replace("\\%", "%").replace("\\_", "_").to_lowercase();
      text(*col).is_some_and(|t| t.to_lowercase().contains(&needle))
    }
    Filter::Gte(col, v) => number(*col).is_some_and(|n| n >= *v),
    Filter::Lte(col, v) => number(*col).is_some_and(|n| n <= *v),
    Filter::In(col, values) => text(*col).is_some_and(|t| values.contains(&t)),
    Filter::IsNull(col) => row.get(*col).map_or(true, Value::is_null),
    Filter::Or(inner) => inner.iter().any(|f| matches(row, f)),
  }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
  filters.iter().all(|f| matches(row, f))
}

/// In-memory `RemoteDb`: tables of JSON rows, canned procedure results, and a call log.
#[derive(Default)]
pub struct FakeDb {
  tables: Mutex<HashMap<Table, Vec<Value>>>,
  rpc_results: Mutex<HashMap<&'static str, std::result::Result<Value, String>>>,
  rpc_calls: Mutex<Vec<Rpc>>,
  log: Mutex<Vec<String>>,
  unavailable: Mutex<bool>,
}

impl FakeDb {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn seed(&self, table: Table, row: Value) {
    self.tables.lock().entry(table).or_default().push(row);
  }

  pub fn rows(&self, table: Table) -> Vec<Value> {
    self.tables.lock().get(&table).cloned().unwrap_or_default()
  }

  /// Canned result for a procedure; `Err(message)` is a database rejection.
  pub fn on_rpc(&self, name: &'static str, result: std::result::Result<Value, String>) {
    self.rpc_results.lock().insert(name, result);
  }

  pub fn rpc_calls(&self) -> Vec<Rpc> {
    self.rpc_calls.lock().clone()
  }

  pub fn log(&self) -> Vec<String> {
    self.log.lock().clone()
  }

  /// Every call fails as if the store were unreachable.
  pub fn go_down(&self) {
    *self.unavailable.lock() = true;
  }

  fn record(&self, entry: String) -> std::result::Result<(), DbError> {
    self.log.lock().push(entry);
    if *self.unavailable.lock() {
      return Err(DbError::Unavailable("connection refused".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl RemoteDb for FakeDb {
  async fn select(&self, query: &Select) -> std::result::Result<Rows, DbError> {
    self.record(format!("select:{}", query.table))?;
    let matched: Vec<Value> = self
      .rows(query.table)
      .into_iter()
      .filter(|row| matches_all(row, &query.filters))
      .collect();
    let total = matched.len() as i64;
    let offset = query.offset.unwrap_or(0).max(0) as usize;
    let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);
    let rows = matched.into_iter().skip(offset).take(limit).collect::<Vec<_>>();
    Ok(Rows { rows, total })
  }

  async fn insert(&self, table: Table, row: Value) -> std::result::Result<Value, DbError> {
    self.record(format!("insert:{}", table))?;
    let mut row = row;
    if let Some(obj) = row.as_object_mut() {
      obj.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
      obj.entry("created_at").or_insert_with(|| json!(Utc::now()));
      match table {
        Table::Offers => {
          obj.entry("status").or_insert_with(|| json!("pending"));
        }
        Table::Notifications => {
          obj.entry("is_read").or_insert(json!(false));
        }
        _ => {}
      }
    }
    self.seed(table, row.clone());
    Ok(row)
  }

  async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> std::result::Result<Vec<Value>, DbError> {
    self.record(format!("update:{}", table))?;
    if filters.is_empty() {
      return Err(DbError::Unfiltered("update"));
    }
    let mut tables = self.tables.lock();
    let mut updated = Vec::new();
    for row in tables.entry(table).or_default().iter_mut() {
      if !matches_all(row, filters) {
        continue;
      }
      if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
        for (k, v) in changes {
          target.insert(k.clone(), v.clone());
        }
      }
      updated.push(row.clone());
    }
    Ok(updated)
  }

  async fn delete(&self, table: Table, filters: &[Filter]) -> std::result::Result<u64, DbError> {
    self.record(format!("delete:{}", table))?;
    if filters.is_empty() {
      return Err(DbError::Unfiltered("delete"));
    }
    let mut tables = self.tables.lock();
    let rows = tables.entry(table).or_default();
    let before = rows.len();
    rows.retain(|row| !matches_all(row, filters));
    Ok((before - rows.len()) as u64)
  }

  async fn rpc(&self, call: &Rpc) -> std::result::Result<Value, DbError> {
    self.record(format!("rpc:{}", call.name()))?;
    self.rpc_calls.lock().push(call.clone());
    match self.rpc_results.lock().get(call.name()) {
      Some(Ok(value)) => Ok(value.clone()),
      Some(Err(message)) => Err(DbError::Rejected {
        message: message.clone(),
      }),
      None => Ok(Value::Null),
    }
  }
}

#[derive(Default)]
pub struct FakeGateway {
  pub initialized: Mutex<Vec<InitializeTransaction>>,
  pub verify_status: Mutex<Option<String>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
  async fn initialize(&self, request: &InitializeTransaction) -> Result<Authorization> {
    self.initialized.lock().push(request.clone());
    Ok(Authorization {
      authorization_url: format!("https://checkout.paystack.test/{}", request.reference),
      access_code: "access_test".to_string(),
      reference: request.reference.clone(),
    })
  }

  async fn verify(&self, reference: &str) -> Result<Verification> {
    let status = self.verify_status.lock().clone().unwrap_or_else(|| "success".to_string());
    Ok(Verification {
      status,
      reference: reference.to_string(),
      amount: 0,
      currency: Some("NGN".to_string()),
    })
  }
}

#[derive(Default)]
pub struct FakeStorage {
  pub uploads: Mutex<Vec<(String, String, usize)>>,
  pub fail: Mutex<bool>,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
  async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
    if *self.fail.lock() {
      return Err(AppError::Storage("bucket not found".to_string()));
    }
    self.uploads.lock().push((path.to_string(), content_type.to_string(), bytes.len()));
    Ok(format!("https://cdn.test/{}", path))
  }
}

pub fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: "postgres://unused".to_string(),
    database_max_connections: 1,
    app_base_url: "http://localhost:8080".to_string(),
    auth_jwt_secret: JWT_SECRET.to_string(),
    auth_jwt_audience: JWT_AUDIENCE.to_string(),
    paystack_secret_key: PAYSTACK_SECRET.to_string(),
    paystack_base_url: "http://paystack.invalid".to_string(),
    paystack_currency: "NGN".to_string(),
    storage_url: "http://storage.invalid".to_string(),
    storage_service_key: "service-key".to_string(),
    storage_bucket: "item-images".to_string(),
    page_cache_ttl: Duration::from_secs(60),
    search_alert_debounce: Duration::from_millis(20),
  }
}

pub struct Harness {
  pub db: Arc<FakeDb>,
  pub gateway: Arc<FakeGateway>,
  pub storage: Arc<FakeStorage>,
  pub state: AppState,
}

pub fn harness() -> Harness {
  setup_tracing();
  let db = FakeDb::new();
  let gateway = Arc::new(FakeGateway::default());
  let storage = Arc::new(FakeStorage::default());
  let state = AppState::new(
    Arc::new(test_config()),
    db.clone(),
    gateway.clone(),
    storage.clone(),
  );
  Harness {
    db,
    gateway,
    storage,
    state,
  }
}

pub fn bearer(user_id: Uuid) -> (&'static str, String) {
  let token = issue_session_token(user_id, JWT_SECRET, JWT_AUDIENCE, Duration::from_secs(3600))
    .expect("token should sign");
  ("Authorization", format!("Bearer {}", token))
}

/// Session whose token carries an email claim.
pub fn bearer_with_email(user_id: Uuid, email: &str) -> (&'static str, String) {
  let token = issue_session_token_with_email(user_id, Some(email), JWT_SECRET, JWT_AUDIENCE, Duration::from_secs(3600))
    .expect("token should sign");
  ("Authorization", format!("Bearer {}", token))
}

// --- Row builders ---

pub fn profile_row(id: Uuid, role: &str, email: Option<&str>) -> Value {
  json!({
    "id": id,
    "username": format!("user_{}", &id.simple().to_string()[..8]),
    "full_name": null,
    "email": email,
    "role": role,
    "review_count": 0,
    "created_at": Utc::now(),
  })
}

pub fn item_row(id: Uuid, seller_id: Uuid, status: &str, price: f64) -> Value {
  json!({
    "id": id,
    "seller_id": seller_id,
    "category_id": null,
    "title": "Oak dining table",
    "description": "Seats six",
    "price": price,
    "condition": "good",
    "status": status,
    "image_urls": [],
    "created_at": Utc::now(),
  })
}

pub fn order_row(id: Uuid, item_id: Uuid, buyer_id: Uuid, seller_id: Uuid, status: &str) -> Value {
  json!({
    "id": id,
    "item_id": item_id,
    "buyer_id": buyer_id,
    "seller_id": seller_id,
    "agent_id": null,
    "status": status,
    "total_amount": 250.0,
    "created_at": Utc::now(),
  })
}

/// A one-pixel PNG's worth of bytes, hex-encoded the way forms send images.
pub fn png_upload() -> Value {
  json!({ "content_type": "image/png", "data": hex::encode([0x89, b'P', b'N', b'G', 0x0d, 0x0a]) })
}
