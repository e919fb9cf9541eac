// noskem/src/services/mod.rs

//! Outbound integrations and process-local helpers the handlers and
//! pipelines share.

pub mod alerts;
pub mod auth_service;
pub mod debounce;
pub mod notifications;
pub mod page_cache;
pub mod paystack;
pub mod storage;
pub mod webhook_signature;
