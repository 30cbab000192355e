//! Handler for `POST /ai/autocomplete`, a pass-through to the completion
//! upstream, relayed as a server-sent event stream.

use axum::{
  body::Body,
  extract::State,
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use tabula_core::store::SheetStore;

use crate::{
  AppState,
  auth::AuthSubject,
  completion::{ChatCompletionRequest, CompletionUpstream, Message, Model},
  error::ApiError,
  payload::Payload,
};

#[derive(Debug, Deserialize)]
pub struct AutocompleteBody {
  pub messages: Vec<Message>,
  /// Defaults to [`Model::Gpt4`].
  pub model:    Option<Model>,
}

/// `POST /ai/autocomplete`, body: [`AutocompleteBody`].
pub async fn autocomplete<S, C>(
  State(state): State<AppState<S, C>>,
  subject: AuthSubject,
  Payload(body): Payload<AutocompleteBody>,
) -> Result<Response, ApiError>
where
  S: SheetStore,
  C: CompletionUpstream,
{
  let request = ChatCompletionRequest::streaming(body.messages, body.model);
  tracing::debug!(
    subject = %subject.0,
    model = ?request.model,
    messages = request.messages.len(),
    "opening completion stream"
  );

  let stream = state.upstream.stream_chat(request).await?;

  let mut res = Body::from_stream(stream).into_response();
  let headers = res.headers_mut();
  headers.insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static("text/event-stream"),
  );
  headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
  headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
  Ok(res)
}
