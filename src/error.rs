//! Unified error types for passthru.
//!
//! Defines [`PassthruError`] (the binary-level error enum),
//! [`ForwardError`] for failures on the forwarding path, [`RedirectError`]
//! for redirect chains the client refuses to follow, and
//! [`ValidationError`] for config validation failures. All use
//! `thiserror` for `Display` and `Error` derives.

use std::path::PathBuf;

use serde::Serialize;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PassthruError {
    #[error("No base URL configured.\n\n  {hint}")]
    NoBaseUrl { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: BoxError,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// A terminal failure while forwarding one request.
///
/// The first three variants happen before the response is committed and are
/// reported to the caller as a JSON error body. The last two happen after
/// status and headers were sent and can only show up as a truncated body.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ForwardError {
    #[error("failed to read request body: {source}")]
    ReadBody {
        #[source]
        source: BoxError,
    },

    #[error("failed to build outbound request: {source}")]
    RequestConstruction {
        #[source]
        source: BoxError,
    },

    #[error("outbound request failed: {source}")]
    Network {
        #[source]
        source: BoxError,
    },

    #[error("response sink does not support incremental flush")]
    StreamingUnsupported,

    #[error("response stream interrupted: {source}")]
    Stream {
        #[source]
        source: BoxError,
    },
}

/// Why a backend redirect was not followed. Reported as a `Network` failure.
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    #[error("stopped after {0} redirects")]
    TooMany(usize),

    #[error("failed to parse Location header {location:?}")]
    InvalidLocation { location: String },
}

impl ForwardError {
    /// Whether status and headers had already been written to the sink.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::StreamingUnsupported | Self::Stream { .. })
    }
}
