// noskem/src/db/mod.rs

//! The hosted store, as the application sees it.
//!
//! Schema, constraints and procedures live in the hosted project. The
//! application only issues parameterized reads and writes and invokes
//! procedures by name through [`RemoteDb`].

pub mod postgres;
pub mod query;
pub mod rpc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use postgres::PgRemote;
pub use query::{Filter, Order, Rows, Select};
pub use rpc::{Rpc, RpcArg};

#[derive(Debug, Error)]
pub enum DbError {
  /// The database answered and refused: a raised exception, a constraint, a permission check.
  #[error("{message}")]
  Rejected { message: String },

  #[error("database unavailable: {0}")]
  Unavailable(String),

  #[error("invalid column name '{0}'")]
  InvalidColumn(String),

  #[error("unexpected row shape: {0}")]
  Decode(String),

  #[error("refusing to {0} without a filter")]
  Unfiltered(&'static str),
}

/// Tables of the hosted schema the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Profiles,
  Items,
  Orders,
  Offers,
  Reviews,
  Notifications,
  FinancialTransactions,
  DisputeMessages,
  InspectionReports,
  ServiceProviders,
  Categories,
  Likes,
  SavedSearches,
}

impl Table {
  pub fn as_str(self) -> &'static str {
    match self {
      Table::Profiles => "profiles",
      Table::Items => "items",
      Table::Orders => "orders",
      Table::Offers => "offers",
      Table::Reviews => "reviews",
      Table::Notifications => "notifications",
      Table::FinancialTransactions => "financial_transactions",
      Table::DisputeMessages => "dispute_messages",
      Table::InspectionReports => "inspection_reports",
      Table::ServiceProviders => "service_providers",
      Table::Categories => "categories",
      Table::Likes => "likes",
      Table::SavedSearches => "saved_searches",
    }
  }
}

impl std::fmt::Display for Table {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Column names are written into SQL text, so only plain identifiers pass.
pub fn check_column(name: &str) -> Result<&str, DbError> {
  let mut chars = name.chars();
  let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
  let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
  if valid_head && valid_tail && name.len() <= 63 {
    Ok(name)
  } else {
    Err(DbError::InvalidColumn(name.to_string()))
  }
}

#[async_trait]
pub trait RemoteDb: Send + Sync {
  async fn select(&self, query: &Select) -> Result<Rows, DbError>;

  /// Inserts one row from a JSON object and returns it as stored.
  async fn insert(&self, table: Table, row: Value) -> Result<Value, DbError>;

  /// Applies `patch` to every row `filters` match; returns the updated rows.
  async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> Result<Vec<Value>, DbError>;

  async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, DbError>;

  async fn rpc(&self, call: &Rpc) -> Result<Value, DbError>;
}

/// Decodes JSON rows into a model.
pub fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, DbError> {
  rows
    .into_iter()
    .map(|row| serde_json::from_value(row).map_err(|e| DbError::Decode(e.to_string())))
    .collect()
}

pub fn decode_row<T: serde::de::DeserializeOwned>(row: Value) -> Result<T, DbError> {
  serde_json::from_value(row).map_err(|e| DbError::Decode(e.to_string()))
}
