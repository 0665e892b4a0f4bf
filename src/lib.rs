//! Receives Backlog webhook deliveries over HTTP and persists each payload
//! to a durable object store under a content-addressed key.
//!
//! The flow is one straight line: `POST /webhook` → validate and normalize
//! the body → derive a storage key → a single atomic put → HTTP status back
//! to the sender. Failures are never retried here; webhook providers retry
//! on non-2xx, and the content-addressed keys absorb the duplicates.

pub mod config;
pub mod error;
pub mod event;
pub mod http_server;
pub mod store;
pub mod verification;
