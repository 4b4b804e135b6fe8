//! Request forwarding: replay an inbound request against a base URL and
//! stream the backend's response back through a [`ResponseSink`].
//!
//! [`forward`] runs three steps in order:
//!
//! 1. capture the inbound body into a [`Bytes`] buffer and rewind the
//!    request so it can be read again,
//! 2. build and dispatch the outbound request (method, raw path and query,
//!    appended headers, replayable body), following backend redirects as
//!    described in [`redirect`],
//! 3. hand the backend response to [`stream::transfer_response`], which
//!    assigns headers, commits the status and relays the body in
//!    [`CHUNK_SIZE`] pieces with a flush after each one.
//!
//! Failures before the status is committed are answered with the JSON
//! [`ErrorEnvelope`] and a 500. Failures after that point end the transfer.

pub mod envelope;
pub mod handler;
pub mod headers;
pub mod redirect;
pub mod sink;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::LazyLock;

use axum::body::Body;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;

pub use envelope::{respond_with_error, ErrorEnvelope};
pub use sink::{ChannelSink, ResponseSink};
pub use stream::{transfer_response, ChunkReader};

use crate::error::ForwardError;
use crate::server::{build_http_client, HttpClient};

/// Upper bound on the bytes relayed between two flushes.
pub const CHUNK_SIZE: usize = 1024;

static SHARED_CLIENT: LazyLock<HttpClient> = LazyLock::new(build_http_client);

/// The process-wide pooled client, built on first use and never torn down.
#[must_use]
pub fn shared_client() -> &'static HttpClient {
    &SHARED_CLIENT
}

/// Forward `request` to `base_url` using the shared client.
pub async fn forward<S>(
    request: &mut Request<Body>,
    sink: &mut S,
    base_url: &str,
) -> Result<(), ForwardError>
where
    S: ResponseSink + ?Sized,
{
    forward_with(shared_client(), request, sink, base_url).await
}

/// Forward `request` to `base_url` through an explicit client.
pub async fn forward_with<S>(
    client: &HttpClient,
    request: &mut Request<Body>,
    sink: &mut S,
    base_url: &str,
) -> Result<(), ForwardError>
where
    S: ResponseSink + ?Sized,
{
    match dispatch(client, request, base_url).await {
        // The backend body lives in `response` and is dropped when the
        // transfer returns, whatever the outcome.
        Ok(response) => transfer_response(sink, response).await,
        Err(err) => {
            if let Err(e) =
                respond_with_error(sink, StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()).await
            {
                tracing::debug!(error = %e, "failed to deliver error response");
            }
            Err(err)
        }
    }
}

async fn dispatch(
    client: &HttpClient,
    request: &mut Request<Body>,
    base_url: &str,
) -> Result<Response<Incoming>, ForwardError> {
    let body = capture_body(request).await?;

    let uri = request.uri();
    let target = build_target_url(base_url, uri.path(), uri.query().unwrap_or(""));

    let outbound = build_outbound(request, &target, body.clone())?;

    tracing::debug!(method = %request.method(), target = %target, "dispatching request");

    redirect::send_following_redirects(client, outbound, body).await
}

/// Read the whole inbound body once, then put an equivalent body back on
/// the request so it can be consumed again.
pub async fn capture_body(request: &mut Request<Body>) -> Result<Bytes, ForwardError> {
    let original = std::mem::take(request.body_mut());
    let bytes = original
        .collect()
        .await
        .map_err(|e| ForwardError::ReadBody {
            source: Box::new(e),
        })?
        .to_bytes();

    *request.body_mut() = Body::from(bytes.clone());
    Ok(bytes)
}

/// Concatenate base URL, path and query verbatim. No `?` for an empty query.
#[must_use]
pub fn build_target_url(base_url: &str, path: &str, query: &str) -> String {
    let mut target = String::with_capacity(base_url.len() + path.len() + query.len() + 1);
    target.push_str(base_url);
    target.push_str(path);
    if !query.is_empty() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn build_outbound(
    inbound: &Request<Body>,
    target: &str,
    body: Bytes,
) -> Result<Request<Full<Bytes>>, ForwardError> {
    let mut builder = Request::builder()
        .method(inbound.method().clone())
        .uri(target);

    // `headers_mut` is `None` once the builder holds an error; `body` reports it.
    if let Some(outbound_headers) = builder.headers_mut() {
        headers::copy_request_headers(inbound.headers(), outbound_headers);
    }

    builder
        .body(Full::new(body))
        .map_err(|e| ForwardError::RequestConstruction {
            source: Box::new(e),
        })
}
