//! Serde data structures for the passthru configuration file.
//!
//! [`Config`] derives `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing. Every field is optional in the
//! file so that command-line flags can fill in or override values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Scheme, host and optional path prefix prepended to every inbound path.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Inbound body limit in bytes. Unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body: Option<usize>,
}

impl Config {
    /// Apply command-line overrides on top of file values.
    #[must_use]
    pub fn with_overrides(mut self, base_url: Option<&str>, max_body: Option<usize>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.to_string();
        }
        if max_body.is_some() {
            self.max_body = max_body;
        }
        self
    }
}
