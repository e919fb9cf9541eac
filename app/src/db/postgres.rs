// noskem/src/db/postgres.rs

//! [`RemoteDb`] over a `sqlx` Postgres pool.
//!
//! Rows travel as `jsonb` in both directions: reads select `to_jsonb(t)`,
//! writes go through `jsonb_populate_record` so that only the keys present
//! in the submitted object are written and column defaults still apply.

use super::{check_column, DbError, Filter, RemoteDb, Rows, Rpc, RpcArg, Select, Table};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct PgRemote {
  pool: PgPool,
}

impl PgRemote {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

fn map_sqlx(err: sqlx::Error) -> DbError {
  match err {
    sqlx::Error::Database(db_err) => DbError::Rejected {
      message: db_err.message().to_string(),
    },
    sqlx::Error::RowNotFound => DbError::Decode("no row returned".to_string()),
    sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
      DbError::Decode(err.to_string())
    }
    other => DbError::Unavailable(other.to_string()),
  }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) -> Result<(), DbError> {
  match filter {
    Filter::Eq(col, value) => {
      qb.push(format!("t.{}::text = ", check_column(col)?));
      qb.push_bind(value.clone());
    }
    Filter::Neq(col, value) => {
      qb.push(format!("t.{}::text <> ", check_column(col)?));
      qb.push_bind(value.clone());
    }
    Filter::Ilike(col, pattern) => {
      qb.push(format!("t.{}::text ILIKE ", check_column(col)?));
      qb.push_bind(pattern.clone());
    }
    Filter::Gte(col, value) => {
      qb.push(format!("t.{}::float8 >= ", check_column(col)?));
      qb.push_bind(*value);
    }
    Filter::Lte(col, value) => {
      qb.push(format!("t.{}::float8 <= ", check_column(col)?));
      qb.push_bind(*value);
    }
    Filter::In(col, values) => {
      qb.push(format!("t.{}::text = ANY(", check_column(col)?));
      qb.push_bind(values.clone());
      qb.push(")");
    }
    Filter::IsNull(col) => {
      qb.push(format!("t.{} IS NULL", check_column(col)?));
    }
    Filter::Or(inner) if inner.is_empty() => {
      qb.push("FALSE");
    }
    Filter::Or(inner) => {
      qb.push("(");
      for (i, f) in inner.iter().enumerate() {
        if i > 0 {
          qb.push(" OR ");
        }
        push_filter(qb, f)?;
      }
      qb.push(")");
    }
  }
  Ok(())
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) -> Result<(), DbError> {
  for (i, filter) in filters.iter().enumerate() {
    qb.push(if i == 0 { " WHERE " } else { " AND " });
    push_filter(qb, filter)?;
  }
  Ok(())
}

/// Keys of a JSON object, each checked as a column name.
fn columns(table: Table, row: &Value) -> Result<Vec<String>, DbError> {
  let obj = row
    .as_object()
    .ok_or_else(|| DbError::Decode(format!("row for '{}' must be a JSON object", table)))?;
  obj.keys().map(|k| check_column(k).map(str::to_string)).collect()
}

pub(crate) fn build_select(query: &Select) -> Result<QueryBuilder<'static, Postgres>, DbError> {
  let mut qb = QueryBuilder::new(format!(
    "SELECT to_jsonb(t) AS doc, count(*) OVER () AS total FROM {} AS t",
    query.table
  ));
  push_where(&mut qb, &query.filters)?;
  if let Some(order) = &query.order {
    qb.push(format!(
      " ORDER BY t.{} {}",
      check_column(order.column)?,
      if order.descending { "DESC NULLS LAST" } else { "ASC" }
    ));
  }
  if let Some(limit) = query.limit {
    qb.push(" LIMIT ");
    qb.push_bind(limit);
  }
  if let Some(offset) = query.offset {
    qb.push(" OFFSET ");
    qb.push_bind(offset);
  }
  Ok(qb)
}

/// Row count for the query's filters alone, ignoring order and paging.
pub(crate) fn build_count(query: &Select) -> Result<QueryBuilder<'static, Postgres>, DbError> {
  let mut qb = QueryBuilder::new(format!("SELECT count(*) AS total FROM {} AS t", query.table));
  push_where(&mut qb, &query.filters)?;
  Ok(qb)
}

pub(crate) fn build_insert(table: Table, row: Value) -> Result<QueryBuilder<'static, Postgres>, DbError> {
  let cols = columns(table, &row)?;
  if cols.is_empty() {
    return Ok(QueryBuilder::new(format!(
      "INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t) AS doc",
      table
    )));
  }
  let list = cols.join(", ");
  let mut qb = QueryBuilder::new(format!(
    "INSERT INTO {table} AS t ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{table}, "
  ));
  qb.push_bind(row);
  qb.push(") RETURNING to_jsonb(t) AS doc");
  Ok(qb)
}

pub(crate) fn build_update(
  table: Table,
  filters: &[Filter],
  patch: Value,
) -> Result<QueryBuilder<'static, Postgres>, DbError> {
  if filters.is_empty() {
    return Err(DbError::Unfiltered("update"));
  }
  let cols = columns(table, &patch)?;
  if cols.is_empty() {
    return Err(DbError::Decode(format!("empty patch for '{}'", table)));
  }
  let list = cols.join(", ");
  let mut qb = QueryBuilder::new(format!(
    "UPDATE {table} AS t SET ({list}) = (SELECT {list} FROM jsonb_populate_record(NULL::{table}, "
  ));
  qb.push_bind(patch);
  qb.push("))");
  push_where(&mut qb, filters)?;
  qb.push(" RETURNING to_jsonb(t) AS doc");
  Ok(qb)
}

pub(crate) fn build_delete(table: Table, filters: &[Filter]) -> Result<QueryBuilder<'static, Postgres>, DbError> {
  if filters.is_empty() {
    return Err(DbError::Unfiltered("delete"));
  }
  let mut qb = QueryBuilder::new(format!("DELETE FROM {} AS t", table));
  push_where(&mut qb, filters)?;
  Ok(qb)
}

pub(crate) fn build_rpc(call: &Rpc) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::new(format!("SELECT to_jsonb({}(", call.name()));
  for (i, (name, arg)) in call.args().into_iter().enumerate() {
    if i > 0 {
      qb.push(", ");
    }
    qb.push(format!("{} => ", name));
    let cast = arg.cast();
    match arg {
      RpcArg::Uuid(v) => qb.push_bind(v),
      RpcArg::Text(v) => qb.push_bind(v),
      RpcArg::Numeric(v) => qb.push_bind(v),
      RpcArg::Bool(v) => qb.push_bind(v),
      RpcArg::TextArray(v) => qb.push_bind(v),
    };
    qb.push(format!("::{}", cast));
  }
  qb.push(")) AS result");
  qb
}

fn doc(row: &PgRow) -> Result<Value, DbError> {
  row.try_get::<Value, _>("doc").map_err(map_sqlx)
}

#[async_trait]
impl RemoteDb for PgRemote {
  #[instrument(name = "db::select", skip(self, query), fields(table = %query.table), err(Display))]
  async fn select(&self, query: &Select) -> Result<Rows, DbError> {
    let rows = build_select(query)?.build().fetch_all(&self.pool).await.map_err(map_sqlx)?;
    // Past the last page no row carries the window count.
    let total = match rows.first() {
      Some(row) => row.try_get::<i64, _>("total").map_err(map_sqlx)?,
      None if query.offset.unwrap_or(0) > 0 => build_count(query)?
        .build()
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?
        .try_get::<i64, _>("total")
        .map_err(map_sqlx)?,
      None => 0,
    };
    let rows = rows.iter().map(doc).collect::<Result<Vec<_>, _>>()?;
    debug!(count = rows.len(), total, "Rows fetched.");
    Ok(Rows { rows, total })
  }

  #[instrument(name = "db::insert", skip(self, row), fields(%table), err(Display))]
  async fn insert(&self, table: Table, row: Value) -> Result<Value, DbError> {
    let stored = build_insert(table, row)?.build().fetch_one(&self.pool).await.map_err(map_sqlx)?;
    doc(&stored)
  }

  #[instrument(name = "db::update", skip(self, filters, patch), fields(%table), err(Display))]
  async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> Result<Vec<Value>, DbError> {
    let rows = build_update(table, filters, patch)?
      .build()
      .fetch_all(&self.pool)
      .await
      .map_err(map_sqlx)?;
    debug!(count = rows.len(), "Rows updated.");
    rows.iter().map(doc).collect()
  }

  #[instrument(name = "db::delete", skip(self, filters), fields(%table), err(Display))]
  async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, DbError> {
    let done = build_delete(table, filters)?.build().execute(&self.pool).await.map_err(map_sqlx)?;
    Ok(done.rows_affected())
  }

  #[instrument(name = "db::rpc", skip(self, call), fields(procedure = call.name()), err(Display))]
  async fn rpc(&self, call: &Rpc) -> Result<Value, DbError> {
    let row = build_rpc(call).build().fetch_one(&self.pool).await.map_err(map_sqlx)?;
    let result = row.try_get::<Option<Value>, _>("result").map_err(map_sqlx)?;
    Ok(result.unwrap_or(Value::Null))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use uuid::Uuid;

  #[test]
  fn select_binds_every_value() {
    let q = Select::table(Table::Items)
      .eq("status", "available")
      .filter(Filter::Or(vec![
        Filter::contains("title", "chair"),
        Filter::contains("description", "chair"),
      ]))
      .filter(Filter::Lte("price", 500.0))
      .newest_first()
      .range(20, 20);
    let qb = build_select(&q).unwrap();
    assert_eq!(
      qb.sql(),
      "SELECT to_jsonb(t) AS doc, count(*) OVER () AS total FROM items AS t \
       WHERE t.status::text = $1 AND (t.title::text ILIKE $2 OR t.description::text ILIKE $3) \
       AND t.price::float8 <= $4 ORDER BY t.created_at DESC NULLS LAST LIMIT $5 OFFSET $6"
    );
  }

  #[test]
  fn count_keeps_filters_and_drops_paging() {
    let q = Select::table(Table::Notifications)
      .eq("user_id", Uuid::nil())
      .newest_first()
      .range(40, 20);
    let qb = build_count(&q).unwrap();
    assert_eq!(
      qb.sql(),
      "SELECT count(*) AS total FROM notifications AS t WHERE t.user_id::text = $1"
    );
  }

  #[test]
  fn insert_writes_only_submitted_keys() {
    let qb = build_insert(Table::Likes, json!({"item_id": Uuid::nil(), "user_id": Uuid::nil()})).unwrap();
    assert_eq!(
      qb.sql(),
      "INSERT INTO likes AS t (item_id, user_id) SELECT item_id, user_id \
       FROM jsonb_populate_record(NULL::likes, $1) RETURNING to_jsonb(t) AS doc"
    );
  }

  #[test]
  fn bad_column_names_never_reach_sql() {
    let err = build_insert(Table::Profiles, json!({"role; --": "admin"})).err();
    assert!(matches!(err, Some(DbError::InvalidColumn(_))));
  }

  #[test]
  fn unfiltered_writes_are_refused() {
    assert!(matches!(
      build_update(Table::Items, &[], json!({"status": "archived"})).err(),
      Some(DbError::Unfiltered("update"))
    ));
    assert!(matches!(build_delete(Table::Likes, &[]).err(), Some(DbError::Unfiltered("delete"))));
  }

  #[test]
  fn rpc_uses_named_arguments_with_casts() {
    let qb = build_rpc(&Rpc::ProcessOrderPayment {
      order_id: Uuid::nil(),
      user_id: Uuid::nil(),
      reference: "ref_1".to_string(),
    });
    assert_eq!(
      qb.sql(),
      "SELECT to_jsonb(process_order_payment(p_order_id => $1::uuid, p_user_id => $2::uuid, \
       p_reference => $3::text)) AS result"
    );
  }
}
