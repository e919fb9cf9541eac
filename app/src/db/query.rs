// noskem/src/db/query.rs

use super::Table;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  Eq(&'static str, String),
  Neq(&'static str, String),
  /// Case-insensitive `LIKE`; the pattern is passed through as given.
  Ilike(&'static str, String),
  Gte(&'static str, f64),
  Lte(&'static str, f64),
  In(&'static str, Vec<String>),
  IsNull(&'static str),
  /// Any of the inner filters matches.
  Or(Vec<Filter>),
}

impl Filter {
  pub fn eq(column: &'static str, value: impl ToString) -> Self {
    Filter::Eq(column, value.to_string())
  }

  /// Case-insensitive "contains", with `%`, `_` and `\` in `needle` escaped.
  pub fn contains(column: &'static str, needle: &str) -> Self {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    Filter::Ilike(column, format!("%{}%", escaped))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
  pub column: &'static str,
  pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
  pub table: Table,
  pub filters: Vec<Filter>,
  pub order: Option<Order>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

impl Select {
  pub fn table(table: Table) -> Self {
    Self {
      table,
      filters: Vec::new(),
      order: None,
      limit: None,
      offset: None,
    }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn eq(self, column: &'static str, value: impl ToString) -> Self {
    self.filter(Filter::eq(column, value))
  }

  pub fn order_by(mut self, column: &'static str, descending: bool) -> Self {
    self.order = Some(Order { column, descending });
    self
  }

  pub fn newest_first(self) -> Self {
    self.order_by("created_at", true)
  }

  pub fn limit(mut self, limit: i64) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn range(mut self, offset: i64, limit: i64) -> Self {
    self.offset = Some(offset);
    self.limit = Some(limit);
    self
  }
}

/// One page of rows plus the count of all rows the filters matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
  pub rows: Vec<Value>,
  pub total: i64,
}

impl Rows {
  pub fn first(self) -> Option<Value> {
    self.rows.into_iter().next()
  }
}
