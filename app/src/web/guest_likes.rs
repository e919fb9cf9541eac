// noskem/src/web/guest_likes.rs

//! Likes for visitors without an account, kept client-side in a cookie.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::HttpRequest;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "noskem_guest_likes";
pub const MAX_GUEST_LIKES: usize = 100;

/// Ordered, duplicate-free item ids, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestLikes(Vec<Uuid>);

impl GuestLikes {
  /// Parses a cookie value. Entries that are not ids, and repeats, are dropped.
  pub fn parse(raw: &str) -> Self {
    let mut likes = GuestLikes::default();
    for id in raw.split(',').filter_map(|part| Uuid::parse_str(part.trim()).ok()) {
      likes.add(id);
    }
    likes
  }

  pub fn from_request(req: &HttpRequest) -> Self {
    req
      .cookie(COOKIE_NAME)
      .map(|c| Self::parse(c.value()))
      .unwrap_or_default()
  }

  /// Appends `id` unless present; beyond the cap the oldest entry goes.
  pub fn add(&mut self, id: Uuid) -> bool {
    if self.contains(id) {
      return false;
    }
    self.0.push(id);
    if self.0.len() > MAX_GUEST_LIKES {
      self.0.remove(0);
    }
    true
  }

  pub fn remove(&mut self, id: Uuid) -> bool {
    let before = self.0.len();
    self.0.retain(|x| *x != id);
    self.0.len() != before
  }

  pub fn contains(&self, id: Uuid) -> bool {
    self.0.contains(&id)
  }

  pub fn ids(&self) -> &[Uuid] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn to_cookie_value(&self) -> String {
    self.0.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
  }

  pub fn to_cookie(&self) -> Cookie<'static> {
    Cookie::build(COOKIE_NAME, self.to_cookie_value())
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .max_age(CookieDuration::days(365))
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
  }

  fn list_of(items: &[Uuid]) -> GuestLikes {
    let mut likes = GuestLikes::default();
    for id in items {
      likes.add(*id);
    }
    likes
  }

  #[test]
  fn add_then_remove_restores_the_list() {
    for n in [0, 1, 5, MAX_GUEST_LIKES - 1] {
      let original = list_of(&ids(n));
      let x = Uuid::new_v4();
      let mut likes = original.clone();
      assert!(likes.add(x));
      assert!(likes.remove(x));
      assert_eq!(likes, original);
    }
  }

  #[test]
  fn adding_twice_equals_adding_once() {
    let x = Uuid::new_v4();
    let mut once = list_of(&ids(3));
    let mut twice = once.clone();
    once.add(x);
    twice.add(x);
    assert!(!twice.add(x));
    assert_eq!(once, twice);
  }

  #[test]
  fn parse_drops_garbage_and_duplicates() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let raw = format!("{a}, nope,{b},{a},,");
    assert_eq!(GuestLikes::parse(&raw).ids(), &[a, b]);
    assert_eq!(GuestLikes::parse(&GuestLikes::parse(&raw).to_cookie_value()).ids(), &[a, b]);
  }

  #[test]
  fn cap_evicts_the_oldest() {
    let all = ids(MAX_GUEST_LIKES + 1);
    let likes = list_of(&all);
    assert_eq!(likes.len(), MAX_GUEST_LIKES);
    assert!(!likes.contains(all[0]));
    assert!(likes.contains(all[MAX_GUEST_LIKES]));
  }
}
