//! Client-side frame sink
//!
//! A bounded channel between the session task and the response body. The
//! receiver is dropped when the client disconnects, which surfaces here as a
//! write failure.

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// Frames buffered between the session task and the response body
pub const SINK_CAPACITY: usize = 32;

/// Message from a session to the response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkMessage {
    /// Bytes to write to the client
    Frame(Bytes),
    /// The session failed before writing anything
    Abort(String),
}

/// The client is no longer reading
#[derive(Debug, Error)]
#[error("client disconnected")]
pub struct SinkClosed;

/// Sending half of a session's output channel
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<SinkMessage>,
    written: usize,
}

impl ChannelSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SinkMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, written: 0 }, rx)
    }

    /// Write one frame, waiting while the channel is full
    pub async fn write(&mut self, frame: Bytes) -> Result<(), SinkClosed> {
        self.tx
            .send(SinkMessage::Frame(frame))
            .await
            .map_err(|_| SinkClosed)?;
        self.written += 1;
        Ok(())
    }

    /// Report a failure that happened before any frame was written
    pub async fn abort(&mut self, message: String) -> Result<(), SinkClosed> {
        self.tx
            .send(SinkMessage::Abort(message))
            .await
            .map_err(|_| SinkClosed)
    }

    /// Frames written so far
    pub fn written(&self) -> usize {
        self.written
    }
}
