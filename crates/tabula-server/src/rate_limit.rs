//! Per-subject rate limiting for the backup and completion routes.
//!
//! Backed by a keyed `governor` GCRA limiter held in process memory. Each
//! subject starts with `max` requests and gets one back per elapsed `window`,
//! so no span of `window` ever admits more than `max`. Counters are lost on
//! restart.

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
  extract::{Request, State},
  http::HeaderValue,
  middleware::Next,
  response::{IntoResponse, Response},
};
use governor::{
  Quota, RateLimiter,
  clock::{Clock, DefaultClock},
  middleware::StateInformationMiddleware,
  state::keyed::DefaultKeyedStateStore,
};
use thiserror::Error;

use crate::{auth::AuthSubject, error::ApiError};

/// Bucket shared by requests that carry no subject.
pub const ANONYMOUS_KEY: &str = "anonymous";

type KeyedLimiter = RateLimiter<
  String,
  DefaultKeyedStateStore<String>,
  DefaultClock,
  StateInformationMiddleware,
>;

#[derive(Debug, Error)]
#[error("invalid rate limit: {max} requests per {window:?}")]
pub struct InvalidQuota {
  pub max:    u32,
  pub window: Duration,
}

pub struct SubjectRateLimiter {
  limiter: KeyedLimiter,
  limit:   HeaderValue,
}

impl SubjectRateLimiter {
  /// Allow `max` requests per `window` for every subject.
  pub fn new(max: u32, window: Duration) -> Result<Self, InvalidQuota> {
    let invalid = || InvalidQuota { max, window };
    let burst = NonZeroU32::new(max).ok_or_else(invalid)?;
    let quota = Quota::with_period(window)
      .ok_or_else(invalid)?
      .allow_burst(burst);

    Ok(Self {
      limiter: RateLimiter::keyed(quota)
        .with_middleware::<StateInformationMiddleware>(),
      limit:   HeaderValue::from(max),
    })
  }

  /// Spend one request for `key`. On success returns the remaining
  /// allowance; otherwise the error carries the wait in whole seconds.
  pub fn check(&self, key: &str) -> Result<u32, ApiError> {
    match self.limiter.check_key(&key.to_owned()) {
      Ok(snapshot) => Ok(snapshot.remaining_burst_capacity()),
      Err(not_until) => {
        let wait = not_until.wait_time_from(self.limiter.clock().now());
        Err(ApiError::RateLimited {
          retry_after_secs: wait.as_secs().max(1),
        })
      }
    }
  }

  /// Drop state for keys whose allowance is fully replenished.
  pub fn retain_recent(&self) {
    self.limiter.retain_recent();
    self.limiter.shrink_to_fit();
  }
}

/// Middleware: rejects with 429 once the caller's subject is over quota.
/// Must run inside [`crate::auth::require_bearer`] to see the subject.
pub async fn limit_by_subject(
  State(limiter): State<Arc<SubjectRateLimiter>>,
  req: Request,
  next: Next,
) -> Response {
  let key = req
    .extensions()
    .get::<AuthSubject>()
    .map_or(ANONYMOUS_KEY, |s| s.0.as_str())
    .to_owned();

  match limiter.check(&key) {
    Ok(remaining) => {
      let mut res = next.run(req).await;
      let headers = res.headers_mut();
      headers.insert("ratelimit-limit", limiter.limit.clone());
      headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
      res
    }
    Err(e) => {
      tracing::warn!(subject = %key, "rate limit exceeded");
      e.into_response()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const THREE_HOURS: Duration = Duration::from_secs(3 * 60 * 60);

  #[test]
  fn allows_max_then_rejects() {
    let limiter = SubjectRateLimiter::new(3, THREE_HOURS).unwrap();
    let first = limiter.check("alice").unwrap();
    limiter.check("alice").unwrap();
    let last = limiter.check("alice").unwrap();
    assert!(last < first);
    let err = limiter.check("alice").unwrap_err();
    assert!(matches!(err, ApiError::RateLimited { retry_after_secs } if retry_after_secs > 0));
  }

  #[test]
  fn subjects_are_independent() {
    let limiter = SubjectRateLimiter::new(1, THREE_HOURS).unwrap();
    assert!(limiter.check("alice").is_ok());
    assert!(limiter.check("alice").is_err());
    assert!(limiter.check("bob").is_ok());
    assert!(limiter.check(ANONYMOUS_KEY).is_ok());
  }

  #[test]
  fn default_quota_allows_twenty_five() {
    let limiter = SubjectRateLimiter::new(25, THREE_HOURS).unwrap();
    for _ in 0..25 {
      assert!(limiter.check("alice").is_ok());
    }
    assert!(limiter.check("alice").is_err());
  }

  #[test]
  fn allowance_does_not_refill_inside_the_window() {
    let limiter = SubjectRateLimiter::new(2, Duration::from_millis(800)).unwrap();
    assert!(limiter.check("alice").is_ok());
    assert!(limiter.check("alice").is_ok());

    std::thread::sleep(Duration::from_millis(450));
    assert!(limiter.check("alice").is_err());
  }

  #[test]
  fn one_request_returns_after_a_full_window() {
    let limiter = SubjectRateLimiter::new(2, Duration::from_millis(200)).unwrap();
    assert!(limiter.check("alice").is_ok());
    assert!(limiter.check("alice").is_ok());
    assert!(limiter.check("alice").is_err());

    std::thread::sleep(Duration::from_millis(300));
    assert!(limiter.check("alice").is_ok());
    assert!(limiter.check("alice").is_err());
  }

  #[test]
  fn zero_max_or_window_is_invalid() {
    assert!(SubjectRateLimiter::new(0, THREE_HOURS).is_err());
    assert!(SubjectRateLimiter::new(5, Duration::ZERO).is_err());
  }
}
