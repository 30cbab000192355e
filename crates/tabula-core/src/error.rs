//! Error types for `tabula-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("file contents are not valid JSON text: {0}")]
  InvalidContents(#[source] serde_json::Error),

  #[error("file uuid must not be empty")]
  EmptyUuid,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
