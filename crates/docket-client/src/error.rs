//! Error type for `docket-client`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain error raised before any request went out (local validation)
  /// — same type and messages as the native store raises.
  #[error(transparent)]
  Core(#[from] docket_core::Error),

  /// Transport-level failure: connect, timeout, TLS, or a body that did
  /// not decode as the expected type.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-success status.
  #[error("{status}: {message}")]
  Api {
    status:  StatusCode,
    message: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
