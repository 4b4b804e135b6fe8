use std::io;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};

use super::ResponseSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Status(StatusCode),
    Write(Vec<u8>),
    Flush,
}

/// In-memory sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub headers: HeaderMap,
    pub status: Option<StatusCode>,
    pub writes: Vec<Vec<u8>>,
    pub events: Vec<Event>,
    pub flushable: bool,
    /// Fail the write with this index (0-based) and every one after it.
    pub fail_write_at: Option<usize>,
}

impl RecordingSink {
    pub fn flushable() -> Self {
        Self {
            flushable: true,
            ..Self::default()
        }
    }

    pub fn unflushable() -> Self {
        Self::default()
    }

    pub fn body(&self) -> Vec<u8> {
        self.writes.concat()
    }

    pub fn flushes(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Flush).count()
    }
}

#[async_trait]
impl ResponseSink for RecordingSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
            self.events.push(Event::Status(status));
        }
    }

    fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.fail_write_at.is_some_and(|at| self.writes.len() >= at) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"));
        }
        self.write_status(StatusCode::OK);
        self.writes.push(chunk.to_vec());
        self.events.push(Event::Write(chunk.to_vec()));
        Ok(())
    }

    fn supports_flush(&self) -> bool {
        self.flushable
    }

    async fn flush(&mut self) -> io::Result<()> {
        if !self.flushable {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "no flush"));
        }
        self.events.push(Event::Flush);
        Ok(())
    }
}
