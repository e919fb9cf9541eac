// noskem/src/web/pagination.rs

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 50;

/// `?page=&per_page=` as sent. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<i64>,
  pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: i64,
  pub per_page: i64,
}

impl PageQuery {
  pub fn resolve(self) -> PageRequest {
    PageRequest {
      page: self.page.unwrap_or(1).max(1),
      per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
    }
  }
}

impl PageRequest {
  pub fn offset(self) -> i64 {
    (self.page - 1).saturating_mul(self.per_page)
  }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
  pub items: Vec<T>,
  pub page: i64,
  pub per_page: i64,
  pub total: i64,
  pub total_pages: i64,
}

impl<T> Paginated<T> {
  pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
    let total = total.max(0);
    Self {
      items,
      page: request.page,
      per_page: request.per_page,
      total,
      total_pages: (total + request.per_page - 1) / request.per_page,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn query(page: Option<i64>, per_page: Option<i64>) -> PageRequest {
    PageQuery { page, per_page }.resolve()
  }

  #[test]
  fn defaults_and_clamping() {
    assert_eq!(query(None, None), PageRequest { page: 1, per_page: 20 });
    assert_eq!(query(Some(0), Some(0)), PageRequest { page: 1, per_page: 1 });
    assert_eq!(query(Some(-3), Some(500)), PageRequest { page: 1, per_page: 50 });
  }

  #[test]
  fn offset_is_zero_based() {
    assert_eq!(query(Some(1), Some(20)).offset(), 0);
    assert_eq!(query(Some(3), Some(20)).offset(), 40);
  }

  #[test]
  fn total_pages_rounds_up() {
    let req = query(Some(1), Some(20));
    assert_eq!(Paginated::<()>::new(vec![], req, 0).total_pages, 0);
    assert_eq!(Paginated::<()>::new(vec![], req, 20).total_pages, 1);
    assert_eq!(Paginated::<()>::new(vec![], req, 21).total_pages, 2);
  }
}
