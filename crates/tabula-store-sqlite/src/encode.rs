//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and file contents as compact
//! JSON text.

use chrono::{DateTime, Utc};
use tabula_core::{file::File, user::User};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Contents ────────────────────────────────────────────────────────────────

pub fn encode_contents(v: &serde_json::Value) -> Result<String> {
  Ok(serde_json::to_string(v)?)
}

pub fn decode_contents(s: &str) -> Result<serde_json::Value> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, auth_subject, created_date";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:           i64,
  pub auth_subject: String,
  pub created_date: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      auth_subject: row.get(1)?,
      created_date: row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:           self.id,
      auth_subject: self.auth_subject,
      created_date: decode_dt(&self.created_date)?,
    })
  }
}

pub const FILE_COLUMNS: &str = "id, uuid, name, contents, version, \
                                times_updated, created_date, updated_date, \
                                owner_id";

/// Raw values read directly from a `files` row, in [`FILE_COLUMNS`] order.
pub struct RawFile {
  pub id:            i64,
  pub uuid:          String,
  pub name:          String,
  pub contents:      Option<String>,
  pub version:       Option<String>,
  pub times_updated: i64,
  pub created_date:  String,
  pub updated_date:  String,
  pub owner_id:      i64,
}

impl RawFile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      uuid:          row.get(1)?,
      name:          row.get(2)?,
      contents:      row.get(3)?,
      version:       row.get(4)?,
      times_updated: row.get(5)?,
      created_date:  row.get(6)?,
      updated_date:  row.get(7)?,
      owner_id:      row.get(8)?,
    })
  }

  pub fn into_file(self) -> Result<File> {
    Ok(File {
      id:            self.id,
      uuid:          self.uuid,
      name:          self.name,
      contents:      self.contents.as_deref().map(decode_contents).transpose()?,
      version:       self.version,
      times_updated: self.times_updated,
      created_date:  decode_dt(&self.created_date)?,
      updated_date:  decode_dt(&self.updated_date)?,
      owner_id:      self.owner_id,
    })
  }
}
