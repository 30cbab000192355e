//! The `SheetStore` trait.
//!
//! Implemented by storage backends (e.g. `tabula-store-sqlite`). The server
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  file::{Backup, File, NewFile},
  user::User,
};

/// Abstraction over a Tabula store backend.
///
/// Every method is a single atomic operation against the backend. All
/// methods return `Send` futures so the trait can be used from axum handlers
/// on a multi-threaded runtime.
pub trait SheetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user for `auth_subject`, creating it if this is the first
  /// time the subject has been seen. Repeated calls return the same row.
  fn upsert_user(
    &self,
    auth_subject: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Files ─────────────────────────────────────────────────────────────

  /// Look up the file owned by `owner_id` with the given `uuid`.
  /// Returns `None` if not found.
  fn get_file(
    &self,
    owner_id: i64,
    uuid: String,
  ) -> impl Future<Output = Result<Option<File>, Self::Error>> + Send + '_;

  /// All files owned by `owner_id`, oldest first.
  fn list_files(
    &self,
    owner_id: i64,
  ) -> impl Future<Output = Result<Vec<File>, Self::Error>> + Send + '_;

  /// Persist a new file. Returns an error if `(owner_id, uuid)` is taken.
  fn create_file(
    &self,
    input: NewFile,
  ) -> impl Future<Output = Result<File, Self::Error>> + Send + '_;

  /// Create-or-update the `(owner_id, backup.uuid)` file in one step.
  ///
  /// - absent: a new file named after its uuid, with
  ///   [`INITIAL_TIMES_UPDATED`](crate::file::INITIAL_TIMES_UPDATED);
  /// - present: contents replaced, `updated_date` refreshed and
  ///   `times_updated` incremented by one.
  ///
  /// Concurrent first-time backups of the same key yield a single row.
  fn backup_file(
    &self,
    owner_id: i64,
    backup: Backup,
  ) -> impl Future<Output = Result<File, Self::Error>> + Send + '_;
}
