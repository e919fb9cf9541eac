// noskem/src/pipelines/validation.rs

//! Input rules checked before any remote write. Every failure is an
//! `AppError::Validation` whose message is shown to the user as-is.

use crate::errors::{AppError, Result};
use crate::models::OrderStatus;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_LISTING_IMAGES: usize = 8;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").unwrap());

fn invalid(msg: &str) -> AppError {
  AppError::Validation(msg.to_string())
}

fn char_len(s: &str) -> usize {
  s.trim().chars().count()
}

pub fn title(value: &str) -> Result<()> {
  match char_len(value) {
    3..=120 => Ok(()),
    _ => Err(invalid("Title must be between 3 and 120 characters")),
  }
}

pub fn description(value: &str) -> Result<()> {
  if char_len(value) > 5000 {
    return Err(invalid("Description must be 5000 characters or fewer"));
  }
  Ok(())
}

pub fn price(value: f64) -> Result<()> {
  if !value.is_finite() || value <= 0.0 {
    return Err(invalid("Price must be greater than zero"));
  }
  Ok(())
}

pub fn image_count(count: usize) -> Result<()> {
  if count == 0 {
    return Err(invalid("Add at least one photo"));
  }
  if count > MAX_LISTING_IMAGES {
    return Err(invalid("A listing can have at most 8 photos"));
  }
  Ok(())
}

/// Latitude and longitude come as a pair or not at all.
pub fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
  match (latitude, longitude) {
    (None, None) => Ok(()),
    (Some(lat), Some(lng)) => {
      if !(-90.0..=90.0).contains(&lat) {
        return Err(invalid("Latitude must be between -90 and 90"));
      }
      if !(-180.0..=180.0).contains(&lng) {
        return Err(invalid("Longitude must be between -180 and 180"));
      }
      Ok(())
    }
    _ => Err(invalid("Provide both latitude and longitude, or neither")),
  }
}

pub fn offer_amount(amount: f64) -> Result<()> {
  if !amount.is_finite() || amount <= 0.0 {
    return Err(invalid("Offer amount must be greater than zero"));
  }
  Ok(())
}

pub fn rating(value: i32) -> Result<()> {
  if !(1..=5).contains(&value) {
    return Err(invalid("Rating must be between 1 and 5"));
  }
  Ok(())
}

pub fn review_comment(value: Option<&str>) -> Result<()> {
  if value.map_or(0, char_len) > 2000 {
    return Err(invalid("Review must be 2000 characters or fewer"));
  }
  Ok(())
}

pub fn dispute_reason(value: &str) -> Result<()> {
  match char_len(value) {
    10..=2000 => Ok(()),
    _ => Err(invalid("Describe the problem in 10 to 2000 characters")),
  }
}

pub fn dispute_message(value: &str) -> Result<()> {
  match char_len(value) {
    1..=2000 => Ok(()),
    _ => Err(invalid("Message must be between 1 and 2000 characters")),
  }
}

/// Statuses an agent or admin may set directly. Inspection outcomes go through reports.
pub fn manual_status(status: OrderStatus) -> Result<()> {
  match status {
    OrderStatus::InTransit | OrderStatus::Delivered | OrderStatus::Cancelled => Ok(()),
    _ => Err(invalid("This status cannot be set directly")),
  }
}

pub fn username(value: &str) -> Result<()> {
  if !USERNAME_RE.is_match(value) {
    return Err(invalid(
      "Username must be 3 to 30 characters of letters, numbers or underscores",
    ));
  }
  Ok(())
}

pub fn phone(value: &str) -> Result<()> {
  if !PHONE_RE.is_match(value) {
    return Err(invalid("Enter a valid phone number"));
  }
  Ok(())
}
