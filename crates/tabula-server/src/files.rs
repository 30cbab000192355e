//! Handlers for file endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | `{"files": [...]}` for the caller |
//! | `GET`  | `/createFile` | `{"created": {...}}` with a placeholder name |
//! | `GET`  | `/files/{uuid}` | `{"file": {...}}`; 404 if the caller has no such file |
//! | `POST` | `/files/backup` | Body: [`BackupBody`]; 200 with an empty body |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tabula_core::{
  file::{Backup, File, NewFile},
  store::SheetStore,
  user::User,
};
use uuid::Uuid;

use crate::{
  AppState, auth::AuthSubject, completion::CompletionUpstream,
  error::ApiError, payload::Payload,
};

/// Map the authenticated subject to its user row, creating it on first
/// sight.
pub async fn resolve_user<S: SheetStore>(
  store: &S,
  subject: &AuthSubject,
) -> Result<User, ApiError> {
  store
    .upsert_user(subject.0.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FileList {
  pub files: Vec<File>,
}

/// `GET /`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  subject: AuthSubject,
) -> Result<Json<FileList>, ApiError>
where
  S: SheetStore,
  C: CompletionUpstream,
{
  let user = resolve_user(state.store.as_ref(), &subject).await?;
  let files = state
    .store
    .list_files(user.id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(FileList { files }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Created {
  pub created: File,
}

/// `GET /createFile`: a contentless file with a generated uuid.
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  subject: AuthSubject,
) -> Result<Json<Created>, ApiError>
where
  S: SheetStore,
  C: CompletionUpstream,
{
  let user = resolve_user(state.store.as_ref(), &subject).await?;
  let created = state
    .store
    .create_file(NewFile::placeholder(user.id, Uuid::new_v4().to_string()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(user_id = user.id, uuid = %created.uuid, "created file");
  Ok(Json(Created { created }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Found {
  pub file: File,
}

/// `GET /files/{uuid}`
pub async fn get_one<S, C>(
  State(state): State<AppState<S, C>>,
  subject: AuthSubject,
  Path(uuid): Path<String>,
) -> Result<Json<Found>, ApiError>
where
  S: SheetStore,
  C: CompletionUpstream,
{
  let user = resolve_user(state.store.as_ref(), &subject).await?;
  let file = state
    .store
    .get_file(user.id, uuid.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("file {uuid} not found")))?;
  Ok(Json(Found { file }))
}

// ─── Backup ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /files/backup`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupBody {
  pub uuid:          String,
  /// The document as JSON text.
  pub file_contents: String,
}

/// `POST /files/backup`: create or overwrite the caller's file for `uuid`.
///
/// The contents are decoded before anything is written, so a bad payload
/// leaves the store untouched (not even the user row is created).
pub async fn backup<S, C>(
  State(state): State<AppState<S, C>>,
  subject: AuthSubject,
  Payload(body): Payload<BackupBody>,
) -> Result<StatusCode, ApiError>
where
  S: SheetStore,
  C: CompletionUpstream,
{
  let backup = Backup::decode(body.uuid, &body.file_contents)?;

  let user = resolve_user(state.store.as_ref(), &subject).await?;
  let file = state
    .store
    .backup_file(user.id, backup)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if file.is_fresh() {
    tracing::debug!(user_id = user.id, uuid = %file.uuid, "backup created file");
  } else {
    tracing::debug!(
      user_id = user.id,
      uuid = %file.uuid,
      times_updated = file.times_updated,
      "backup updated file"
    );
  }
  Ok(StatusCode::OK)
}
