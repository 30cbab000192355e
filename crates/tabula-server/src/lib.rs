//! HTTP API for Tabula.
//!
//! Exposes an axum [`Router`] backed by any [`SheetStore`] and any
//! [`CompletionUpstream`]. Every route requires a bearer token; the backup
//! and completion routes are additionally rate-limited per subject.

pub mod ai;
pub mod auth;
pub mod completion;
pub mod config;
pub mod error;
pub mod files;
pub mod payload;
pub mod rate_limit;

pub use crate::config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  http::{HeaderValue, header::InvalidHeaderValue},
  middleware,
  routing::{get, post},
};
use tabula_core::store::SheetStore;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

use auth::AuthConfig;
use completion::CompletionUpstream;
use rate_limit::SubjectRateLimiter;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S, C> {
  pub store:    Arc<S>,
  pub upstream: Arc<C>,
  pub auth:     Arc<AuthConfig>,
  pub limiter:  Arc<SubjectRateLimiter>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S, C>(state: AppState<S, C>, cors: CorsLayer) -> Router
where
  S: SheetStore + Clone + 'static,
  C: CompletionUpstream + Clone + 'static,
{
  let limited = Router::new()
    .route("/ai/autocomplete", post(ai::autocomplete::<S, C>))
    .route("/files/backup",    post(files::backup::<S, C>))
    .route_layer(middleware::from_fn_with_state(
      state.limiter.clone(),
      rate_limit::limit_by_subject,
    ));

  Router::new()
    .route("/",              get(files::list::<S, C>))
    .route("/createFile",    get(files::create::<S, C>))
    .route("/files/{uuid}",  get(files::get_one::<S, C>))
    .merge(limited)
    .route_layer(middleware::from_fn_with_state(
      state.auth.clone(),
      auth::require_bearer,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

/// CORS for a single allowed origin, or any origin for `*`.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
  let allow_origin = if origin == "*" {
    AllowOrigin::from(Any)
  } else {
    AllowOrigin::exact(HeaderValue::from_str(origin)?)
  };
  Ok(
    CorsLayer::new()
      .allow_origin(allow_origin)
      .allow_methods(Any)
      .allow_headers(Any),
  )
}
