//! Streaming session driver
//!
//! A session pulls upstream events one at a time, translates each and writes
//! the resulting frames to the client in arrival order. Every exit path runs
//! through [`run_session`]: the upstream source is closed exactly once, at most
//! one error frame is written, and nothing is written after the terminal
//! signal. Panics inside translation are caught here and treated like any
//! other fault.

use std::convert::Infallible;
use std::panic::AssertUnwindSafe;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::sink::{ChannelSink, SinkMessage, SINK_CAPACITY};
use super::source::{EventSource, StreamError};
use crate::error::AppError;
use crate::proxy::headers::filter_response_headers;
use crate::routes::metrics;

/// Which way a session translates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AnthropicToOpenAi,
    OpenAiToAnthropic,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::AnthropicToOpenAi => "anthropic_to_openai",
            Direction::OpenAiToAnthropic => "openai_to_anthropic",
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Translator emitted its terminal frames
    Completed,
    /// Upstream failed or ended early; an error frame was sent
    UpstreamError,
    /// Translation failed or panicked
    Faulted,
    /// The client stopped reading
    ClientGone,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Completed => "completed",
            SessionOutcome::UpstreamError => "upstream_error",
            SessionOutcome::Faulted => "faulted",
            SessionOutcome::ClientGone => "client_gone",
        }
    }
}

/// Frames produced by one translation step
#[derive(Debug, Default)]
pub struct Step {
    pub frames: Vec<Bytes>,
    /// The frames include the terminal signal
    pub done: bool,
}

impl Step {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn frames(frames: Vec<Bytes>) -> Self {
        Self {
            frames,
            done: false,
        }
    }

    pub fn done(frames: Vec<Bytes>) -> Self {
        Self { frames, done: true }
    }
}

/// Per-direction translation state machine
pub trait StreamTranslator: Send {
    type Event: Send;

    fn direction(&self) -> Direction;

    /// Frames written before any upstream event is consumed
    fn start(&mut self) -> Result<Vec<Bytes>, StreamError>;

    /// Translate one upstream event
    fn translate(&mut self, event: Self::Event) -> Result<Step, StreamError>;

    /// In-band error frame in the client's dialect
    fn error_frame(&self, message: &str) -> Bytes;
}

/// Drive one session to completion
pub async fn run_session<S, T>(mut source: S, mut translator: T, mut sink: ChannelSink) -> SessionOutcome
where
    S: EventSource,
    T: StreamTranslator<Event = S::Event>,
{
    let direction = translator.direction();

    let result = AssertUnwindSafe(drive(&mut source, &mut translator, &mut sink))
        .catch_unwind()
        .await;

    source.close().await;

    let failure = match result {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) if !e.is_fault() => {
            warn!(direction = direction.as_str(), error = %e, "Upstream stream failed");
            Err((SessionOutcome::UpstreamError, e.to_string()))
        }
        Ok(Err(e)) => {
            error!(direction = direction.as_str(), error = %e, "Stream translation failed");
            Err((SessionOutcome::Faulted, e.to_string()))
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(direction = direction.as_str(), panic = %message, "Stream translation panicked");
            Err((
                SessionOutcome::Faulted,
                "internal stream translation failure".to_string(),
            ))
        }
    };

    let outcome = match failure {
        Ok(outcome) => outcome,
        Err((outcome, message)) => {
            // A fault before the first frame becomes a 500 instead of a stream
            let frame = translator.error_frame(&message);
            if outcome == SessionOutcome::Faulted && sink.written() == 0 {
                let _ = sink.abort(message).await;
            } else {
                let _ = sink.write(frame).await;
            }
            outcome
        }
    };

    metrics::record_stream_session(direction.as_str(), outcome.as_str());
    info!(
        direction = direction.as_str(),
        outcome = outcome.as_str(),
        frames = sink.written(),
        "Stream session ended"
    );
    outcome
}

async fn drive<S, T>(source: &mut S, translator: &mut T, sink: &mut ChannelSink) -> Result<SessionOutcome, StreamError>
where
    S: EventSource,
    T: StreamTranslator<Event = S::Event>,
{
    for frame in translator.start()? {
        if sink.write(frame).await.is_err() {
            return Ok(SessionOutcome::ClientGone);
        }
    }

    loop {
        let event = match source.next_event().await {
            Some(Ok(event)) => event,
            Some(Err(e)) => return Err(e),
            None => return Err(StreamError::Truncated),
        };

        let step = translator.translate(event)?;
        for frame in step.frames {
            if sink.write(frame).await.is_err() {
                debug!("Client disconnected mid-stream");
                return Ok(SessionOutcome::ClientGone);
            }
        }

        if step.done {
            return Ok(SessionOutcome::Completed);
        }
    }
}

/// Headers sent with every streaming response
pub fn sse_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Cache-Control"),
    );
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    headers
}

/// Spawn a translation session and build the client response from its output.
///
/// Waits for the session's first message: a frame starts a 200 SSE response,
/// an early failure becomes a 500.
pub async fn stream_response<S, T>(source: S, translator: T) -> Response
where
    S: EventSource + 'static,
    T: StreamTranslator<Event = S::Event> + 'static,
{
    let (sink, rx) = ChannelSink::channel(SINK_CAPACITY);
    tokio::spawn(run_session(source, translator, sink));
    into_sse_response(rx).await
}

async fn into_sse_response(mut rx: mpsc::Receiver<SinkMessage>) -> Response {
    let first = match rx.recv().await {
        Some(SinkMessage::Frame(frame)) => frame,
        Some(SinkMessage::Abort(message)) => {
            return AppError::Internal(anyhow::anyhow!(message)).into_response();
        }
        None => {
            return AppError::Internal(anyhow::anyhow!("stream session ended without output"))
                .into_response();
        }
    };

    let body = async_stream::stream! {
        yield Ok::<_, Infallible>(first);
        while let Some(message) = rx.recv().await {
            if let SinkMessage::Frame(frame) = message {
                yield Ok(frame);
            }
        }
    };

    (StatusCode::OK, sse_headers(), Body::from_stream(body)).into_response()
}

/// Relay a same-dialect response body unmodified
pub fn passthrough_response(upstream: reqwest::Response, streaming: bool) -> Response {
    let mut headers = filter_response_headers(upstream.headers());
    if streaming {
        headers.extend(sse_headers());
    }

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::OK);
    (status, headers, Body::from_stream(upstream.bytes_stream())).into_response()
}
