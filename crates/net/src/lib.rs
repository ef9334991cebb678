//! HTTP plumbing for slipway's registry and forge traffic.
//!
//! Everything that leaves the process over HTTP goes through
//! [`request_with_retry`], which wraps a [`reqwest::Client`] call in the
//! generic [`with_retry`] loop. Retry policy is a pure function of a
//! [`RetryKind`] classification, never of concrete error types, so
//! callers can reuse the loop for non-HTTP operations too.

mod error;
mod retry;

pub use error::{Error, Result};
pub use retry::{RetryConfig, RetryKind, is_retryable_status, request_with_retry, with_retry};
