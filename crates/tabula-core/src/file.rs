//! Spreadsheet files a user backs up.
//!
//! A file is owned by exactly one user and addressed by a client-assigned
//! `uuid` that is unique per owner. Only the latest contents are kept; the
//! `times_updated` counter records how often they were overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name given to files created through the bare "create file" route.
pub const PLACEHOLDER_NAME: &str = "first file!";

/// Value of [`File::times_updated`] for a freshly created file.
pub const INITIAL_TIMES_UPDATED: i64 = 1;

// ─── File ────────────────────────────────────────────────────────────────────

/// A persisted file row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
  pub id:            i64,
  /// Client-assigned identifier; immutable once the row exists.
  pub uuid:          String,
  pub name:          String,
  /// The decoded document. `None` for files created without contents.
  pub contents:      Option<serde_json::Value>,
  /// Document format version. Never populated by the server.
  pub version:       Option<String>,
  pub times_updated: i64,
  pub created_date:  DateTime<Utc>,
  pub updated_date:  DateTime<Utc>,
  pub owner_id:      i64,
}

impl File {
  /// Whether this row was produced by the first write for its uuid.
  pub fn is_fresh(&self) -> bool { self.times_updated == INITIAL_TIMES_UPDATED }
}

// ─── NewFile ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::SheetStore::create_file`].
/// Timestamps and the update counter are always set by the store.
#[derive(Debug, Clone)]
pub struct NewFile {
  pub owner_id: i64,
  pub uuid:     String,
  pub name:     String,
  pub contents: Option<serde_json::Value>,
}

impl NewFile {
  /// A contentless file with the placeholder name.
  pub fn placeholder(owner_id: i64, uuid: impl Into<String>) -> Self {
    Self {
      owner_id,
      uuid: uuid.into(),
      name: PLACEHOLDER_NAME.to_owned(),
      contents: None,
    }
  }
}

// ─── Backup payload ──────────────────────────────────────────────────────────

/// A validated backup request: the target uuid and the document decoded
/// from its JSON-text encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Backup {
  pub uuid:     String,
  pub contents: serde_json::Value,
}

impl Backup {
  /// Decode `encoded` (JSON text of the document) exactly once.
  pub fn decode(uuid: impl Into<String>, encoded: &str) -> Result<Self> {
    let uuid = uuid.into();
    if uuid.is_empty() {
      return Err(Error::EmptyUuid);
    }
    let contents =
      serde_json::from_str(encoded).map_err(Error::InvalidContents)?;
    Ok(Self { uuid, contents })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn decode_parses_json_text_once() {
    let backup = Backup::decode("abc", r#"{"cells":[]}"#).unwrap();
    assert_eq!(backup.uuid, "abc");
    assert_eq!(backup.contents, json!({ "cells": [] }));
  }

  #[test]
  fn decode_keeps_nested_strings_encoded() {
    // Only one layer of encoding is removed.
    let backup = Backup::decode("abc", r#""{\"a\":1}""#).unwrap();
    assert_eq!(backup.contents, json!("{\"a\":1}"));
  }

  #[test]
  fn decode_rejects_invalid_text() {
    let err = Backup::decode("abc", "{cells:").unwrap_err();
    assert!(matches!(err, Error::InvalidContents(_)));
  }

  #[test]
  fn decode_rejects_empty_uuid() {
    assert!(matches!(Backup::decode("", "{}"), Err(Error::EmptyUuid)));
  }

  #[test]
  fn placeholder_has_no_contents() {
    let file = NewFile::placeholder(7, "u-1");
    assert_eq!(file.name, PLACEHOLDER_NAME);
    assert_eq!(file.owner_id, 7);
    assert!(file.contents.is_none());
  }
}
