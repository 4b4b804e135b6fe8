//! The response side of a forwarded exchange.
//!
//! [`ResponseSink`] is what the forwarder writes into: a header map that
//! is assigned before commit, a status write that commits, body writes,
//! and an explicit flush that a sink may or may not support.
//!
//! [`ChannelSink`] is the sink used by the HTTP handler. Committing sends
//! an axum [`Response`] through a oneshot channel; its body is fed from an
//! mpsc channel, one frame per flush.

use std::convert::Infallible;
use std::io;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use tokio::sync::{mpsc, oneshot};

/// Bytes a [`ChannelSink`] holds before it flushes on its own.
const WRITE_BUFFER_SIZE: usize = 4096;

/// Body frames queued between the forwarding task and the connection.
const CHANNEL_CAPACITY: usize = 8;

// async_trait keeps the trait object-safe so the forwarder can take `&mut dyn ResponseSink`.
#[async_trait]
pub trait ResponseSink: Send {
    /// Headers sent when the status is committed. Changes after commit are
    /// never sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers. Calls after the first are ignored.
    fn write_status(&mut self, status: StatusCode);

    fn is_committed(&self) -> bool;

    /// Write body bytes, committing `200 OK` first if nothing was committed.
    /// Bytes may stay buffered until [`flush`](Self::flush).
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Whether [`flush`](Self::flush) can push bytes out incrementally.
    fn supports_flush(&self) -> bool {
        false
    }

    async fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sink does not support flush",
        ))
    }
}

/// Receives the response head once a [`ChannelSink`] commits.
pub type PendingResponse = oneshot::Receiver<Response>;

pub struct ChannelSink {
    headers: HeaderMap,
    uncommitted: Option<(oneshot::Sender<Response>, mpsc::Receiver<Bytes>)>,
    body_tx: mpsc::Sender<Bytes>,
    buffer: BytesMut,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let sink = Self {
            headers: HeaderMap::new(),
            uncommitted: Some((head_tx, body_rx)),
            body_tx,
            buffer: BytesMut::new(),
        };
        (sink, head_rx)
    }
}

#[async_trait]
impl ResponseSink for ChannelSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        let Some((head_tx, body_rx)) = self.uncommitted.take() else {
            tracing::warn!(status = %status, "response already committed, ignoring status");
            return;
        };

        let frames = futures_util::stream::unfold(body_rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
        });

        let mut response = Response::new(Body::from_stream(frames));
        *response.status_mut() = status;
        *response.headers_mut() = std::mem::take(&mut self.headers);

        if head_tx.send(response).is_err() {
            tracing::debug!("caller went away before the response was committed");
        }
    }

    fn is_committed(&self) -> bool {
        self.uncommitted.is_none()
    }

    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if !self.is_committed() {
            self.write_status(StatusCode::OK);
        }
        self.buffer.extend_from_slice(chunk);
        if self.buffer.len() >= WRITE_BUFFER_SIZE {
            self.flush().await?;
        }
        Ok(())
    }

    fn supports_flush(&self) -> bool {
        true
    }

    async fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let frame = self.buffer.split().freeze();
        self.body_tx
            .send(frame)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))
    }
}

impl Drop for ChannelSink {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            // Best effort: the task is going away and cannot await capacity.
            let tail = self.buffer.split().freeze();
            let len = tail.len();
            if let Err(e) = self.body_tx.try_send(tail) {
                tracing::debug!(bytes = len, error = %e, "dropped unflushed response tail");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn next_frame(body: &mut Body) -> Option<Bytes> {
        body.frame()
            .await
            .map(|frame| frame.unwrap().into_data().unwrap())
    }

    #[tokio::test]
    async fn commit_sends_status_and_headers() {
        let (mut sink, pending) = ChannelSink::new();
        sink.headers_mut()
            .insert("content-type", "text/event-stream".parse().unwrap());
        assert!(!sink.is_committed());

        sink.write_status(StatusCode::ACCEPTED);
        assert!(sink.is_committed());

        let response = pending.await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
    }

    #[tokio::test]
    async fn each_flush_emits_one_frame() {
        let (mut sink, pending) = ChannelSink::new();
        sink.write_status(StatusCode::OK);
        let mut body = pending.await.unwrap().into_body();

        sink.write(b"data: one\n\n").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(next_frame(&mut body).await.unwrap(), "data: one\n\n");

        sink.write(b"data: ").await.unwrap();
        sink.write(b"two\n\n").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(next_frame(&mut body).await.unwrap(), "data: two\n\n");

        drop(sink);
        assert!(next_frame(&mut body).await.is_none());
    }

    #[tokio::test]
    async fn write_before_commit_implies_ok() {
        let (mut sink, pending) = ChannelSink::new();
        sink.write(b"hello").await.unwrap();
        sink.flush().await.unwrap();

        let response = pending.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn second_status_is_ignored() {
        let (mut sink, pending) = ChannelSink::new();
        sink.write_status(StatusCode::NOT_FOUND);
        sink.write_status(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(pending.await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn flush_fails_once_caller_is_gone() {
        let (mut sink, pending) = ChannelSink::new();
        sink.write_status(StatusCode::OK);
        drop(pending.await.unwrap());

        sink.write(b"late").await.unwrap();
        let err = sink.flush().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn unflushed_bytes_are_sent_on_drop() {
        let (mut sink, pending) = ChannelSink::new();
        sink.write(b"tail").await.unwrap();
        let mut body = pending.await.unwrap().into_body();

        drop(sink);
        assert_eq!(next_frame(&mut body).await.unwrap(), "tail");
        assert!(next_frame(&mut body).await.is_none());
    }
    #[tokio::test]
    async fn tail_is_discarded_when_channel_is_full() {
        let (mut sink, pending) = ChannelSink::new();
        sink.write_status(StatusCode::OK);
        let mut body = pending.await.unwrap().into_body();

        for i in 0..CHANNEL_CAPACITY {
            sink.write(format!("frame-{i}").as_bytes()).await.unwrap();
            sink.flush().await.unwrap();
        }
        sink.write(b"tail").await.unwrap();
        drop(sink);

        for i in 0..CHANNEL_CAPACITY {
            assert_eq!(next_frame(&mut body).await.unwrap(), format!("frame-{i}"));
        }
        assert!(next_frame(&mut body).await.is_none());
    }
}
