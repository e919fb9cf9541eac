// noskem/src/services/storage.rs

//! Uploads to the hosted object store and the image rules applied before them.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
  /// Stores `bytes` at `path` and returns the object's public URL.
  async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Checks an image upload and returns the file extension to store it under.
pub fn validate_image(content_type: &str, len: usize) -> Result<&'static str> {
  let ext = match content_type.trim().to_ascii_lowercase().as_str() {
    "image/jpeg" => "jpg",
    "image/png" => "png",
    "image/webp" => "webp",
    other => {
      return Err(AppError::Validation(format!(
        "Unsupported image type '{}'. Use JPEG, PNG or WebP",
        other
      )))
    }
  };
  if len == 0 {
    return Err(AppError::Validation("Image file is empty".to_string()));
  }
  if len > MAX_IMAGE_BYTES {
    return Err(AppError::Validation("Each image must be 5 MB or smaller".to_string()));
  }
  Ok(ext)
}

/// `{owner}/{random}.{ext}`: owners only ever write under their own prefix.
pub fn object_path(owner: Uuid, ext: &str) -> String {
  format!("{}/{}.{}", owner, Uuid::new_v4(), ext)
}

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
  #[serde(default)]
  message: String,
  #[serde(default)]
  error: String,
}

impl StorageErrorBody {
  fn into_message(self) -> Option<String> {
    [self.message, self.error].into_iter().find(|m| !m.is_empty())
  }
}

#[derive(Clone)]
pub struct StorageClient {
  http: reqwest::Client,
  base_url: String,
  service_key: String,
  bucket: String,
}

impl StorageClient {
  pub fn new(base_url: impl Into<String>, service_key: impl Into<String>, bucket: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      service_key: service_key.into(),
      bucket: bucket.into(),
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(&config.storage_url, &config.storage_service_key, &config.storage_bucket)
  }

  pub fn public_url(&self, path: &str) -> String {
    format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
  }
}

#[async_trait]
impl ObjectStorage for StorageClient {
  #[instrument(name = "storage::upload", skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()), err(Display))]
  async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
    let response = self
      .http
      .post(format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path))
      .bearer_auth(&self.service_key)
      .header("apikey", &self.service_key)
      .header(reqwest::header::CONTENT_TYPE, content_type)
      .header("x-upsert", "false")
      .body(bytes)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<StorageErrorBody>(&body)
        .ok()
        .and_then(StorageErrorBody::into_message)
        .unwrap_or_else(|| format!("storage responded with {}", status));
      warn!(http_status = %status, %message, "Upload refused.");
      return Err(AppError::Storage(message));
    }

    info!("Object stored.");
    Ok(self.public_url(path))
  }
}
