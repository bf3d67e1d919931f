//! Upstream event sources
//!
//! An [`EventSource`] is a forward-only, non-restartable sequence of typed
//! upstream events. [`SseEventSource`] implements it over an SSE byte stream.

use std::collections::VecDeque;
use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use thiserror::Error;
use tracing::debug;

use super::{SseFrame, SseFrameDecoder};
use crate::dialect::anthropic::StreamEvent;
use crate::dialect::openai::{ChunkPayload, StreamChunk};

/// Errors raised while pulling or translating stream events
#[derive(Debug, Error)]
pub enum StreamError {
    /// The upstream reported an error in-band
    #[error("{message}")]
    Upstream { message: String },

    /// The upstream connection failed mid-stream
    #[error("upstream connection failed: {0}")]
    Transport(String),

    /// An upstream frame could not be decoded
    #[error("malformed upstream event: {0}")]
    Decode(String),

    /// The upstream ended before its terminal event
    #[error("upstream stream ended before completion")]
    Truncated,

    /// An outbound frame could not be encoded
    #[error("failed to encode stream frame: {0}")]
    Encode(#[from] serde_json::Error),

    /// The translator was driven outside its protocol
    #[error("stream protocol violation: {0}")]
    Protocol(String),
}

impl StreamError {
    /// Whether this failure originated in the gateway rather than upstream
    pub fn is_fault(&self) -> bool {
        matches!(self, StreamError::Encode(_) | StreamError::Protocol(_))
    }
}

/// Lazy sequence of upstream events
#[async_trait]
pub trait EventSource: Send {
    type Event: Send;

    /// Next event; `None` once the upstream has ended
    async fn next_event(&mut self) -> Option<Result<Self::Event, StreamError>>;

    /// Release the upstream connection
    async fn close(&mut self);
}

/// Outcome of decoding one SSE frame
#[derive(Debug)]
pub enum Decoded<E> {
    Event(E),
    /// Frame carries nothing for the translator
    Skip,
    /// Explicit end-of-stream marker
    Done,
}

/// Typed decoding of SSE frames
pub trait DecodeFrame: Sized + Send {
    fn decode(frame: &SseFrame) -> Result<Decoded<Self>, StreamError>;
}

impl DecodeFrame for StreamEvent {
    fn decode(frame: &SseFrame) -> Result<Decoded<Self>, StreamError> {
        if frame.data.trim().is_empty() {
            return Ok(Decoded::Skip);
        }

        let event: StreamEvent =
            serde_json::from_str(&frame.data).map_err(|e| StreamError::Decode(e.to_string()))?;

        match event {
            StreamEvent::Ping => Ok(Decoded::Skip),
            StreamEvent::Error { error } => Err(StreamError::Upstream {
                message: error.message,
            }),
            event => Ok(Decoded::Event(event)),
        }
    }
}

impl DecodeFrame for StreamChunk {
    fn decode(frame: &SseFrame) -> Result<Decoded<Self>, StreamError> {
        let data = frame.data.trim();
        if data.is_empty() {
            return Ok(Decoded::Skip);
        }
        if data == "[DONE]" {
            return Ok(Decoded::Done);
        }

        match serde_json::from_str(data).map_err(|e| StreamError::Decode(e.to_string()))? {
            ChunkPayload::Error { error } => Err(StreamError::Upstream {
                message: error.message,
            }),
            ChunkPayload::Chunk(chunk) => Ok(Decoded::Event(chunk)),
        }
    }
}

/// [`EventSource`] over an SSE byte stream
pub struct SseEventSource<E> {
    body: Option<BoxStream<'static, Result<Bytes, StreamError>>>,
    decoder: SseFrameDecoder,
    pending: VecDeque<SseFrame>,
    ended: bool,
    _event: PhantomData<fn() -> E>,
}

impl<E: DecodeFrame> SseEventSource<E> {
    pub fn new<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, StreamError>> + Send + 'static,
    {
        Self {
            body: Some(body.boxed()),
            decoder: SseFrameDecoder::new(),
            pending: VecDeque::new(),
            ended: false,
            _event: PhantomData,
        }
    }

    /// Source reading the body of an upstream response
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(
            response
                .bytes_stream()
                .map_err(|e| StreamError::Transport(e.to_string())),
        )
    }
}

#[async_trait]
impl<E: DecodeFrame> EventSource for SseEventSource<E> {
    type Event = E;

    async fn next_event(&mut self) -> Option<Result<E, StreamError>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                match E::decode(&frame) {
                    Ok(Decoded::Event(event)) => return Some(Ok(event)),
                    Ok(Decoded::Skip) => continue,
                    Ok(Decoded::Done) => {
                        self.ended = true;
                        self.pending.clear();
                        return None;
                    }
                    Err(e) => return Some(Err(e)),
                }
            }

            if self.ended {
                return None;
            }

            let body = self.body.as_mut()?;
            match body.next().await {
                Some(Ok(bytes)) => self.pending.extend(self.decoder.feed(&bytes)),
                Some(Err(e)) => {
                    self.ended = true;
                    return Some(Err(e));
                }
                None => {
                    self.ended = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.body.take().is_some() {
            debug!(undelivered_frames = self.pending.len(), "Upstream stream closed");
        }
        self.ended = true;
        self.pending.clear();
    }
}
