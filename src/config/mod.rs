//! Configuration loading and validation.
//!
//! A config file is optional: everything it holds can also be given on the
//! command line. [`parse_config_str`] deserializes by file extension
//! (YAML, JSON, TOML behind feature flags) and [`load_file`] reads one from
//! disk. Configuration is read once at startup and never reloaded.

pub mod model;
pub mod validation;

use std::path::Path;

use crate::error::PassthruError;
use model::Config;

/// File names looked up in the working directory when no `--config` is given.
pub const CANDIDATE_FILES: &[&str] = &[
    "passthru.yaml",
    "passthru.yml",
    "passthru.json",
    "passthru.toml",
];

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, PassthruError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| PassthruError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| PassthruError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| PassthruError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(PassthruError::UnsupportedFormat(other.to_string())),
    }
}

/// Read and parse a config file. Validation happens after CLI overrides.
pub async fn load_file(path: &Path) -> Result<Config, PassthruError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PassthruError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PassthruError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_config_str(ext, &content, &path.display().to_string())
}
