//! HTTP transport adapter (axum).
//!
//! One Envelope per request. Handlers receive it explicitly as `&mut Envelope`;
//! whatever the handler does, the envelope is encoded and written as the whole
//! response body with a JSON content type.

use axum::body::Body;
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;

use crate::envelope::Envelope;
use crate::types::{EnvelopeConfig, Error};

/// Content type of every envelope response.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// Error text used by [`error_handler`] when no message is given.
pub const DEFAULT_ERROR_MESSAGE: &str = "iojson.ErrorHandler";

/// Run `handler` against a fresh envelope and always respond with it.
///
/// A returned `Err` and a panic inside the handler future are both recorded
/// as envelope errors, so the response is still a well-formed document.
pub async fn echo<F, E>(config: EnvelopeConfig, handler: F) -> Response
where
    F: for<'a> FnOnce(&'a mut Envelope) -> BoxFuture<'a, Result<(), E>>,
    E: fmt::Display,
{
    let mut envelope = Envelope::with_config(config);
    let outcome = AssertUnwindSafe(handler(&mut envelope)).catch_unwind().await;
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => envelope.add_error(err.to_string()),
        Err(_) => {
            tracing::error!("envelope handler panicked");
            envelope.add_error("handler panicked");
        }
    }
    echo_response(&mut envelope)
}

/// Handler for [`echo`] that only records `message` as an error.
///
/// An empty message is replaced by [`DEFAULT_ERROR_MESSAGE`].
pub fn error_handler(
    message: impl Into<String>,
) -> impl for<'a> FnOnce(&'a mut Envelope) -> BoxFuture<'a, Result<(), Infallible>> {
    let mut message = message.into();
    if message.is_empty() {
        message = DEFAULT_ERROR_MESSAGE.to_string();
    }
    handler(move |envelope| {
        async move {
            envelope.add_error(message);
            Ok(())
        }
        .boxed()
    })
}

// Pins a closure to the higher-ranked signature `echo` expects.
fn handler<F, E>(f: F) -> F
where
    F: for<'a> FnOnce(&'a mut Envelope) -> BoxFuture<'a, Result<(), E>>,
{
    f
}

/// Encode `envelope` into a JSON response.
///
/// If the response cannot be assembled the client gets a bare `500`.
pub fn echo_response(envelope: &mut Envelope) -> Response {
    let body = envelope.encode();
    Response::builder()
        .header(header::CONTENT_TYPE, CONTENT_TYPE_JSON)
        .body(Body::from(body))
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to build envelope response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

impl IntoResponse for Envelope {
    fn into_response(mut self) -> Response {
        echo_response(&mut self)
    }
}

/// Extractor that decodes the request body into a fresh Envelope.
///
/// The body limit comes from the `EnvelopeConfig` in router state. Oversized
/// bodies are rejected with `413`, malformed ones with `400`; both rejections
/// are themselves error envelopes.
#[derive(Debug)]
pub struct Inbound(pub Envelope);

impl<S> FromRequest<S> for Inbound
where
    S: Send + Sync,
    EnvelopeConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let config = EnvelopeConfig::from_ref(state);
        let limit = config.max_decode_bytes;

        let mut body = Vec::new();
        let mut stream = req.into_body().into_data_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| {
                tracing::warn!(error = %err, "failed to read request body");
                rejection(config.clone(), StatusCode::BAD_REQUEST, &Error::Io(std::io::Error::other(err)))
            })?;
            if (body.len() + chunk.len()) as u64 > limit {
                let err = Error::SizeLimitExceeded { limit };
                tracing::warn!(error = %err, "inbound envelope rejected");
                return Err(rejection(config, StatusCode::PAYLOAD_TOO_LARGE, &err));
            }
            body.extend_from_slice(&chunk);
        }

        let mut envelope = Envelope::with_config(config.clone());
        envelope.decode_slice(&body).map_err(|err| {
            let status = match err {
                Error::SizeLimitExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            rejection(config, status, &err)
        })?;
        Ok(Self(envelope))
    }
}

fn rejection(config: EnvelopeConfig, status: StatusCode, err: &Error) -> Response {
    let mut envelope = Envelope::with_config(config);
    envelope.add_error(err.to_string());
    let mut response = echo_response(&mut envelope);
    *response.status_mut() = status;
    response
}
