//! The persistent record behind an authenticated subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user row. Created lazily the first time a subject authenticates and
/// never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  /// Surrogate key; referenced by [`File::owner_id`](crate::file::File).
  pub id:           i64,
  /// The `sub` claim of the bearer token. Unique and immutable.
  pub auth_subject: String,
  pub created_date: DateTime<Utc>,
}
