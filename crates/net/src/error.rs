//! Error types for HTTP operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for HTTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during HTTP traffic.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Transport-level failure from the HTTP client.
    #[error("Request failed: {0}")]
    #[diagnostic(code(slipway::net::request))]
    Request(#[from] reqwest::Error),

    /// The server answered with a status slipway treats as retryable.
    #[error("HTTP {status} from {url}")]
    #[diagnostic(
        code(slipway::net::status),
        help("The server is throttling or briefly unavailable; the request was retried")
    )]
    Status {
        /// The response status code.
        status: u16,
        /// The request URL.
        url: String,
    },
}
