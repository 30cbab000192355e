//! Chat-completion upstream: request types, the [`CompletionUpstream`] seam
//! and the [`OpenAiClient`] implementation.

use std::{future::Future, time::Duration};

use axum::BoxError;
use bytes::Bytes;
use futures_util::{StreamExt as _, TryStreamExt as _, stream::BoxStream};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Request types ───────────────────────────────────────────────────────────

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
  Assistant,
}

/// Completion models a caller may ask for.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum Model {
  #[default]
  #[serde(rename = "gpt-4")]
  Gpt4,
  #[serde(rename = "gpt-3-turbo")]
  Gpt3Turbo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub role:    Role,
  pub content: String,
}

/// Body sent to the upstream chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest {
  pub model:    Model,
  pub messages: Vec<Message>,
  pub stream:   bool,
}

impl ChatCompletionRequest {
  /// A streaming request; `model` falls back to [`Model::default`].
  pub fn streaming(messages: Vec<Message>, model: Option<Model>) -> Self {
    Self {
      model: model.unwrap_or_default(),
      messages,
      stream: true,
    }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
  /// The request could not be constructed, so nothing was sent.
  #[error("{0}")]
  Setup(String),

  /// Transport failure or a non-success answer from the upstream.
  #[error("upstream unavailable: {0}")]
  Unavailable(String),
}

impl From<reqwest::Error> for UpstreamError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_builder() {
      UpstreamError::Setup(e.to_string())
    } else {
      UpstreamError::Unavailable(e.to_string())
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Raw bytes of an event stream, relayed to the caller unchanged.
pub type CompletionStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// A streaming chat-completion backend.
pub trait CompletionUpstream: Send + Sync {
  /// Open a streaming completion. Resolves once the upstream has accepted
  /// the request; the returned stream yields the response body.
  fn stream_chat(
    &self,
    request: ChatCompletionRequest,
  ) -> impl Future<Output = Result<CompletionStream, UpstreamError>> + Send + '_;
}

// ─── OpenAI client ───────────────────────────────────────────────────────────

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client:   reqwest::Client,
  base_url: String,
  api_key:  String,
}

impl OpenAiClient {
  pub fn new(
    base_url: impl Into<String>,
    api_key: impl Into<String>,
  ) -> Result<Self, UpstreamError> {
    let client = reqwest::Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      api_key: api_key.into(),
    })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
  }
}

impl CompletionUpstream for OpenAiClient {
  async fn stream_chat(
    &self,
    request: ChatCompletionRequest,
  ) -> Result<CompletionStream, UpstreamError> {
    let mut builder = self.client.post(self.url()).json(&request);
    if !self.api_key.is_empty() {
      builder = builder.bearer_auth(&self.api_key);
    }

    let resp = builder.send().await?;
    let status = resp.status();

    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(UpstreamError::Unavailable(format!(
        "upstream returned {status}: {body}"
      )));
    }

    Ok(resp.bytes_stream().map_err(BoxError::from).boxed())
  }
}
