//! [`SqliteStore`]: the SQLite implementation of [`SheetStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use tabula_core::{
  file::{Backup, File, INITIAL_TIMES_UPDATED, NewFile},
  store::SheetStore,
  user::User,
};

use crate::{
  Result,
  encode::{
    FILE_COLUMNS, RawFile, RawUser, USER_COLUMNS, encode_contents, encode_dt,
  },
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tabula store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SheetStore impl ─────────────────────────────────────────────────────────

impl SheetStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, auth_subject: String) -> Result<User> {
    let at_str = encode_dt(Utc::now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (auth_subject, created_date) VALUES (?1, ?2)
           ON CONFLICT (auth_subject) DO NOTHING",
          rusqlite::params![auth_subject, at_str],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE auth_subject = ?1"),
          rusqlite::params![auth_subject],
          RawUser::from_row,
        )?)
      })
      .await?;

    raw.into_user()
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  async fn get_file(&self, owner_id: i64, uuid: String) -> Result<Option<File>> {
    let raw: Option<RawFile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 AND uuid = ?2"
            ),
            rusqlite::params![owner_id, uuid],
            RawFile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawFile::into_file).transpose()
  }

  async fn list_files(&self, owner_id: i64) -> Result<Vec<File>> {
    let raws: Vec<RawFile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id], RawFile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFile::into_file).collect()
  }

  async fn create_file(&self, input: NewFile) -> Result<File> {
    let at_str       = encode_dt(Utc::now());
    let contents_str = input.contents.as_ref().map(encode_contents).transpose()?;

    let raw: RawFile = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO files (
               uuid, name, contents, times_updated,
               created_date, updated_date, owner_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)
             RETURNING {FILE_COLUMNS}"
          ),
          rusqlite::params![
            input.uuid,
            input.name,
            contents_str,
            INITIAL_TIMES_UPDATED,
            at_str,
            input.owner_id,
          ],
          RawFile::from_row,
        )?)
      })
      .await?;

    raw.into_file()
  }

  async fn backup_file(&self, owner_id: i64, backup: Backup) -> Result<File> {
    let at_str       = encode_dt(Utc::now());
    let contents_str = encode_contents(&backup.contents)?;

    // Single upsert against UNIQUE (owner_id, uuid).
    let raw: RawFile = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO files (
               uuid, name, contents, times_updated,
               created_date, updated_date, owner_id
             ) VALUES (?1, ?1, ?2, ?3, ?4, ?4, ?5)
             ON CONFLICT (owner_id, uuid) DO UPDATE SET
               contents      = excluded.contents,
               updated_date  = excluded.updated_date,
               times_updated = files.times_updated + 1
             RETURNING {FILE_COLUMNS}"
          ),
          rusqlite::params![
            backup.uuid,
            contents_str,
            INITIAL_TIMES_UPDATED,
            at_str,
            owner_id,
          ],
          RawFile::from_row,
        )?)
      })
      .await?;

    raw.into_file()
  }
}
