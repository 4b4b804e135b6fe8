//! Following backend redirects.
//!
//! 301, 302 and 303 turn any method other than `GET` or `HEAD` into a
//! bodyless `GET`. 307 and 308 keep the method and replay the captured body.
//! A redirect without a `Location` header is returned as the final response.
//! Receiving [`MAX_REDIRECTS`] redirects in one chain is a failure.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use url::Url;

use crate::error::{ForwardError, RedirectError};
use crate::server::HttpClient;

pub const MAX_REDIRECTS: usize = 10;

/// Credentials never carried to a host outside the original domain.
const SENSITIVE_HEADERS: [&str; 5] = [
    "authorization",
    "proxy-authorization",
    "www-authenticate",
    "cookie",
    "cookie2",
];

/// How the request following a redirect is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub method: Method,
    pub replay_body: bool,
}

/// The hop a redirect status calls for, or `None` if `status` is final.
#[must_use]
pub fn redirect_hop(status: StatusCode, method: &Method) -> Option<Hop> {
    match status {
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
            let method = if *method == Method::GET || *method == Method::HEAD {
                method.clone()
            } else {
                Method::GET
            };
            Some(Hop {
                method,
                replay_body: false,
            })
        }
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => Some(Hop {
            method: method.clone(),
            replay_body: true,
        }),
        _ => None,
    }
}

/// Resolve a `Location` value against the URL that produced it.
pub fn resolve_location(current: &str, location: &HeaderValue) -> Result<Url, RedirectError> {
    let invalid = || RedirectError::InvalidLocation {
        location: String::from_utf8_lossy(location.as_bytes()).into_owned(),
    };
    let raw = location.to_str().map_err(|_| invalid())?;
    Url::parse(current)
        .and_then(|base| base.join(raw))
        .map_err(|_| invalid())
}

/// `host` equals `parent` or is one of its subdomains. Case-insensitive.
#[must_use]
pub fn is_domain_or_subdomain(host: &str, parent: &str) -> bool {
    if host.eq_ignore_ascii_case(parent) {
        return true;
    }
    // IP literals only ever match themselves.
    if host.contains(':') || parent.parse::<std::net::IpAddr>().is_ok() {
        return false;
    }
    host.len() > parent.len() + 1
        && host
            .get(host.len() - parent.len() - 1..)
            .is_some_and(|tail| tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(parent))
}

/// Headers for a redirected request, derived from the first request's.
#[must_use]
pub fn hop_headers(initial: &HeaderMap, replay_body: bool, same_domain: bool) -> HeaderMap {
    let mut headers = initial.clone();
    if !replay_body {
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);
    }
    if !same_domain {
        for name in SENSITIVE_HEADERS {
            headers.remove(name);
        }
    }
    headers
}

/// Send `request` and follow redirects until a final response arrives.
///
/// `body` is the captured inbound body, replayed on 307 and 308. Every
/// intermediate response is dropped before the next hop is sent.
pub async fn send_following_redirects(
    client: &HttpClient,
    mut request: Request<Full<Bytes>>,
    body: Bytes,
) -> Result<Response<Incoming>, ForwardError> {
    let initial_headers = request.headers().clone();
    let initial_host = request.uri().host().unwrap_or_default().to_owned();
    let mut redirects = 0;

    loop {
        let method = request.method().clone();
        let current = request.uri().to_string();
        let response = client
            .request(request)
            .await
            .map_err(|e| ForwardError::Network {
                source: Box::new(e),
            })?;

        let status = response.status();
        let Some(hop) = redirect_hop(status, &method) else {
            return Ok(response);
        };
        let Some(location) = response.headers().get(header::LOCATION) else {
            return Ok(response);
        };

        redirects += 1;
        if redirects >= MAX_REDIRECTS {
            return Err(ForwardError::Network {
                source: Box::new(RedirectError::TooMany(MAX_REDIRECTS)),
            });
        }
        let next = resolve_location(&current, location).map_err(|e| ForwardError::Network {
            source: Box::new(e),
        })?;
        drop(response);

        tracing::debug!(
            status = status.as_u16(),
            from = %current,
            to = %next,
            method = %hop.method,
            "following redirect"
        );

        let same_domain = next
            .host_str()
            .is_some_and(|host| is_domain_or_subdomain(host, &initial_host));
        let mut builder = Request::builder()
            .method(hop.method.clone())
            .uri(next.as_str());
        if let Some(headers) = builder.headers_mut() {
            *headers = hop_headers(&initial_headers, hop.replay_body, same_domain);
        }
        let hop_body = if hop.replay_body {
            body.clone()
        } else {
            Bytes::new()
        };
        request = builder
            .body(Full::new(hop_body))
            .map_err(|e| ForwardError::Network {
                source: Box::new(e),
            })?;
    }
}
