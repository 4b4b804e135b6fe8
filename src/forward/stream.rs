//! Relaying a backend response onto a [`ResponseSink`].

use axum::http::Response;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;

use super::headers::assign_response_headers;
use super::{ResponseSink, CHUNK_SIZE};
use crate::error::ForwardError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reads a body as a sequence of chunks no larger than [`CHUNK_SIZE`].
///
/// Frames bigger than the chunk size are split; smaller frames come out as
/// they are. Trailer frames are skipped.
pub struct ChunkReader<B> {
    body: B,
    pending: Bytes,
}

impl<B> ChunkReader<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    pub const fn new(body: B) -> Self {
        Self {
            body,
            pending: Bytes::new(),
        }
    }

    /// The next non-empty chunk, or `None` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, BoxError> {
        loop {
            if !self.pending.is_empty() {
                let len = self.pending.len().min(CHUNK_SIZE);
                return Ok(Some(self.pending.split_to(len)));
            }

            match self.body.frame().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        self.pending = data;
                    }
                }
            }
        }
    }
}

/// Assign headers, commit the status, then relay the body with a flush
/// after every chunk.
///
/// Everything that fails here happens after commit, so nothing is written
/// to the sink on error: the caller sees a truncated body.
pub async fn transfer_response<S, B>(
    sink: &mut S,
    response: Response<B>,
) -> Result<(), ForwardError>
where
    S: ResponseSink + ?Sized,
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();

    assign_response_headers(&parts.headers, sink.headers_mut());
    sink.write_status(parts.status);

    if !sink.supports_flush() {
        return Err(ForwardError::StreamingUnsupported);
    }

    let mut reader = ChunkReader::new(body);
    while let Some(chunk) = reader
        .next_chunk()
        .await
        .map_err(|source| ForwardError::Stream { source })?
    {
        sink.write(&chunk).await.map_err(stream_error)?;
        sink.flush().await.map_err(stream_error)?;
    }

    Ok(())
}

fn stream_error(e: std::io::Error) -> ForwardError {
    ForwardError::Stream {
        source: Box::new(e),
    }
}
