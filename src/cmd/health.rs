//! `passthru health` — check the health of a running instance.
//!
//! Queries the reserved health path of a running proxy and prints its
//! version, uptime, target and request counters, or the raw JSON.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::cli::HealthArgs;
use crate::error::PassthruError;
use crate::forward::shared_client;
use crate::health::{HealthResponse, HEALTH_PATH};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// The health URL of the instance at `base`, which may end in `/`.
fn health_url(base: &str) -> Result<hyper::Uri, PassthruError> {
    format!("{}{HEALTH_PATH}", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| PassthruError::UriParse {
            source: Box::new(e),
        })
}

pub async fn execute(args: HealthArgs) -> Result<(), PassthruError> {
    let req = hyper::Request::get(health_url(&args.url)?)
        .body(Full::new(Bytes::new()))
        .map_err(|e| PassthruError::HttpRequest {
            source: Box::new(e),
        })?;

    // The forwarding client speaks both http and https.
    let response = tokio::time::timeout(HEALTH_TIMEOUT, shared_client().request(req))
        .await
        .map_err(|_| PassthruError::HttpRequest {
            source: format!("health check timed out after {}s", HEALTH_TIMEOUT.as_secs()).into(),
        })?
        .map_err(|e| PassthruError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| PassthruError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(PassthruError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<HealthResponse>(&body) {
        Ok(health) => println!("{}", render_health(&args.url, &health)),
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn render_health(url: &str, health: &HealthResponse) -> String {
    let stats = &health.stats;
    let total = stats.requests_forwarded + stats.requests_failed;
    let failure_rate = if total == 0 {
        String::new()
    } else {
        format!(" ({:.1}% failed)", stats.requests_failed as f64 * 100.0 / total as f64)
    };
    format!(
        "\u{2713} passthru is {} ({url})\n  \
         version:        {}\n  \
         uptime:         {}\n  \
         forwarding to:  {}\n  \
         requests:       {} forwarded, {} failed{failure_rate}",
        health.status,
        health.version,
        format_uptime(health.uptime_seconds),
        health.base_url,
        stats.requests_forwarded,
        stats.requests_failed,
    )
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(forwarded: u64, failed: u64) -> HealthResponse {
        HealthResponse {
            status: "healthy".into(),
            version: "0.1.0".into(),
            uptime_seconds: 125,
            base_url: "http://backend:8080".into(),
            stats: crate::health::StatsResponse {
                requests_forwarded: forwarded,
                requests_failed: failed,
            },
        }
    }

    #[test]
    fn health_url_appends_reserved_path() {
        assert_eq!(
            health_url("http://localhost:3000/").unwrap(),
            "http://localhost:3000/_passthru/health"
        );
        assert!(health_url("not a url").is_err());
    }

    #[test]
    fn rendering_includes_counters() {
        let text = render_health("http://localhost:3000", &sample(3, 1));
        assert!(text.starts_with("\u{2713} passthru is healthy (http://localhost:3000)"));
        assert!(text.contains("uptime:         2m 5s"));
        assert!(text.contains("forwarding to:  http://backend:8080"));
        assert!(text.ends_with("requests:       3 forwarded, 1 failed (25.0% failed)"));
    }

    #[test]
    fn rendering_without_traffic_omits_rate() {
        let text = render_health("http://localhost:3000", &sample(0, 0));
        assert!(text.ends_with("requests:       0 forwarded, 0 failed"));
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
