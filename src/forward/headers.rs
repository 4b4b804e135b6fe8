//! Header copying for both legs of a forwarded exchange.
//!
//! The two legs deliberately differ: request headers are appended to the
//! outbound set, so every value of a repeated header survives, while
//! response headers are assigned per key onto the sink, so a key that was
//! already present ends up with exactly the backend's values.

use axum::http::header::HOST;
use axum::http::HeaderMap;

/// Append every inbound header value to `destination`, preserving order.
///
/// `Host` is left to the transport, which derives it from the target URL.
pub fn copy_request_headers(source: &HeaderMap, destination: &mut HeaderMap) {
    for (name, value) in source {
        if *name == HOST {
            continue;
        }
        destination.append(name, value.clone());
    }
}

/// Replace each key in `destination` with the full value list from `source`.
pub fn assign_response_headers(source: &HeaderMap, destination: &mut HeaderMap) {
    for name in source.keys() {
        let mut values = source.get_all(name).iter();
        if let Some(first) = values.next() {
            destination.insert(name.clone(), first.clone());
            for value in values {
                destination.append(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(headers: &'a HeaderMap, name: &str) -> Vec<&'a str> {
        headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    #[test]
    fn request_headers_keep_every_value() {
        let mut source = HeaderMap::new();
        source.append("x", "1".parse().unwrap());
        source.append("x", "2".parse().unwrap());
        source.insert("content-type", "application/json".parse().unwrap());

        let mut destination = HeaderMap::new();
        copy_request_headers(&source, &mut destination);

        assert_eq!(values(&destination, "x"), ["1", "2"]);
        assert_eq!(values(&destination, "content-type"), ["application/json"]);
    }

    #[test]
    fn request_headers_append_to_existing() {
        let mut source = HeaderMap::new();
        source.insert("accept", "text/html".parse().unwrap());

        let mut destination = HeaderMap::new();
        destination.insert("accept", "application/json".parse().unwrap());
        copy_request_headers(&source, &mut destination);

        assert_eq!(
            values(&destination, "accept"),
            ["application/json", "text/html"]
        );
    }

    #[test]
    fn request_host_is_not_copied() {
        let mut source = HeaderMap::new();
        source.insert("host", "proxy.local:3000".parse().unwrap());

        let mut destination = HeaderMap::new();
        copy_request_headers(&source, &mut destination);

        assert!(destination.get("host").is_none());
    }

    #[test]
    fn response_headers_replace_existing_key() {
        let mut source = HeaderMap::new();
        source.insert("content-type", "text/plain".parse().unwrap());

        let mut destination = HeaderMap::new();
        destination.insert("content-type", "application/json".parse().unwrap());
        destination.insert("x-kept", "yes".parse().unwrap());

        assign_response_headers(&source, &mut destination);
        assign_response_headers(&source, &mut destination);

        assert_eq!(values(&destination, "content-type"), ["text/plain"]);
        assert_eq!(values(&destination, "x-kept"), ["yes"]);
    }

    #[test]
    fn response_headers_keep_multiple_values() {
        let mut source = HeaderMap::new();
        source.append("set-cookie", "a=1".parse().unwrap());
        source.append("set-cookie", "b=2".parse().unwrap());

        let mut destination = HeaderMap::new();
        destination.insert("set-cookie", "stale=0".parse().unwrap());
        assign_response_headers(&source, &mut destination);

        assert_eq!(values(&destination, "set-cookie"), ["a=1", "b=2"]);
    }
}
