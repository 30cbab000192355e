//! Bearer-token authentication: JWT verification, the `require_bearer`
//! middleware and the [`AuthSubject`] extractor.

use std::sync::Arc;

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;

/// Token verification settings for this server instance.
pub struct AuthConfig {
  key:        DecodingKey,
  validation: Validation,
}

/// The only claim the server reads; `exp` (and `aud`/`iss` when configured)
/// are checked by [`Validation`].
#[derive(Debug, Deserialize)]
struct Claims {
  sub: String,
}

/// The `sub` claim of a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject(pub String);

impl AuthConfig {
  /// HS256 verification with an optional audience and issuer requirement.
  pub fn hs256(
    secret: &[u8],
    audience: Option<&str>,
    issuer: Option<&str>,
  ) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    let mut required = vec!["exp", "sub"];
    match audience {
      Some(aud) => {
        validation.set_audience(&[aud]);
        required.push("aud");
      }
      // Tokens minted for some other API audience are still accepted.
      None => validation.validate_aud = false,
    }
    if let Some(iss) = issuer {
      validation.set_issuer(&[iss]);
      required.push("iss");
    }
    validation.set_required_spec_claims(&required);

    Self { key: DecodingKey::from_secret(secret), validation }
  }

  /// Verify the `Authorization: Bearer <jwt>` header.
  pub fn verify(&self, headers: &HeaderMap) -> Result<AuthSubject, ApiError> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?;

    let token = header_val
      .strip_prefix("Bearer ")
      .ok_or_else(|| ApiError::Unauthorized("not a bearer token".into()))?;

    let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
      .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    if data.claims.sub.is_empty() {
      return Err(ApiError::Unauthorized("empty subject".into()));
    }
    Ok(AuthSubject(data.claims.sub))
  }
}

/// Reject unauthenticated requests; otherwise attach the [`AuthSubject`] to
/// the request for the layers and handlers below.
pub async fn require_bearer(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let subject = auth.verify(req.headers()).inspect_err(|e| {
    tracing::warn!(path = %req.uri().path(), error = %e, "rejected request");
  })?;
  req.extensions_mut().insert(subject);
  Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthSubject
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<AuthSubject>()
      .cloned()
      .ok_or_else(|| ApiError::Unauthorized("no authenticated subject".into()))
  }
}

#[cfg(test)]
mod tests {
  use std::time::{SystemTime, UNIX_EPOCH};

  use axum::http::HeaderValue;
  use jsonwebtoken::{EncodingKey, Header};
  use serde_json::{Value, json};

  use super::*;

  const SECRET: &[u8] = b"test-secret";

  fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
  }

  fn sign(claims: Value, secret: &[u8]) -> String {
    jsonwebtoken::encode(
      &Header::default(),
      &claims,
      &EncodingKey::from_secret(secret),
    )
    .unwrap()
  }

  fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
  }

  #[test]
  fn valid_token_yields_subject() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    let token = sign(json!({ "sub": "auth0|alice", "exp": now() + 600 }), SECRET);
    assert_eq!(
      auth.verify(&bearer(&token)).unwrap(),
      AuthSubject("auth0|alice".into())
    );
  }

  #[test]
  fn wrong_secret() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    let token = sign(json!({ "sub": "a", "exp": now() + 600 }), b"other");
    assert!(matches!(auth.verify(&bearer(&token)), Err(ApiError::Unauthorized(_))));
  }

  #[test]
  fn expired_token() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    let token = sign(json!({ "sub": "a", "exp": now() - 3600 }), SECRET);
    assert!(matches!(auth.verify(&bearer(&token)), Err(ApiError::Unauthorized(_))));
  }

  #[test]
  fn missing_exp() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    let token = sign(json!({ "sub": "a" }), SECRET);
    assert!(matches!(auth.verify(&bearer(&token)), Err(ApiError::Unauthorized(_))));
  }

  #[test]
  fn missing_header() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    assert!(matches!(
      auth.verify(&HeaderMap::new()),
      Err(ApiError::Unauthorized(_))
    ));
  }

  #[test]
  fn basic_scheme_is_rejected() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dTpw"));
    assert!(matches!(auth.verify(&headers), Err(ApiError::Unauthorized(_))));
  }

  #[test]
  fn audience_is_ignored_when_not_configured() {
    let auth = AuthConfig::hs256(SECRET, None, None);
    let token = sign(
      json!({ "sub": "auth0|alice", "exp": now() + 600, "aud": "https://api.example" }),
      SECRET,
    );
    assert_eq!(
      auth.verify(&bearer(&token)).unwrap(),
      AuthSubject("auth0|alice".into())
    );
  }

  #[test]
  fn audience_and_issuer_are_enforced_when_configured() {
    let auth = AuthConfig::hs256(SECRET, Some("tabula"), Some("https://issuer/"));

    let good = sign(
      json!({
        "sub": "a", "exp": now() + 600,
        "aud": "tabula", "iss": "https://issuer/",
      }),
      SECRET,
    );
    assert!(auth.verify(&bearer(&good)).is_ok());

    let wrong_aud = sign(
      json!({
        "sub": "a", "exp": now() + 600,
        "aud": "other", "iss": "https://issuer/",
      }),
      SECRET,
    );
    assert!(auth.verify(&bearer(&wrong_aud)).is_err());

    let no_iss = sign(json!({ "sub": "a", "exp": now() + 600, "aud": "tabula" }), SECRET);
    assert!(auth.verify(&bearer(&no_iss)).is_err());
  }
}
