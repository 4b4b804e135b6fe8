//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a merged [`Config`] and returns every
//! problem it finds as a [`ValidationError`] with an optional suggestion.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate the forwarding base URL. Returns `Ok(())` or a human-readable error.
///
/// Inbound paths always start with `/` and are appended verbatim, so the
/// base must be an absolute http(s) URL without query, fragment, or a
/// trailing slash.
pub fn validate_base_url(base_url: &str) -> Result<(), (String, Option<String>)> {
    if base_url.is_empty() {
        return Err((
            "base URL cannot be empty".into(),
            Some("set base_url in the config file or pass --base-url".into()),
        ));
    }

    let parsed =
        Url::parse(base_url).map_err(|_| (format!("'{base_url}' is not a valid URL"), None))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err((
            format!("unsupported scheme '{scheme}' (expected http or https)"),
            None,
        ));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err((
            "base URL must not contain a query string or fragment".into(),
            None,
        ));
    }

    if base_url.ends_with('/') {
        let trimmed = base_url.trim_end_matches('/');
        return Err((
            "base URL must not end with '/'".into(),
            Some(format!("did you mean '{trimmed}'?")),
        ));
    }

    Ok(())
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err((message, suggestion)) = validate_base_url(&config.base_url) {
        errors.push(ValidationError {
            field: "base_url".into(),
            message,
            suggestion,
        });
    }

    if config.max_body == Some(0) {
        errors.push(ValidationError {
            field: "max_body".into(),
            message: "must be greater than zero".into(),
            suggestion: Some("omit it for no limit".into()),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let max_body = config
        .max_body
        .map_or_else(|| "unlimited".to_string(), |b| format!("{b} bytes"));
    format!(
        "{path} is valid\n  base_url: {}\n  max_body: {max_body}",
        config.base_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> Config {
        Config {
            base_url: base_url.into(),
            max_body: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&config("http://localhost:8080")).is_ok());
        assert!(validate(&config("https://api.example.com/v1")).is_ok());
    }

    #[test]
    fn empty_base_url_fails() {
        let errors = validate(&config("")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "base_url");
        assert!(errors[0].message.contains("cannot be empty"));
    }

    #[test]
    fn invalid_url_fails() {
        let errors = validate(&config("not a url")).unwrap_err();
        assert!(errors[0].message.contains("not a valid URL"));
    }

    #[test]
    fn unsupported_scheme_fails() {
        let errors = validate(&config("ftp://files.example.com")).unwrap_err();
        assert!(errors[0].message.contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn query_in_base_url_fails() {
        let errors = validate(&config("http://h?token=1")).unwrap_err();
        assert!(errors[0].message.contains("query string"));
    }

    #[test]
    fn trailing_slash_suggests_fix() {
        let errors = validate(&config("http://localhost:8080/")).unwrap_err();
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean 'http://localhost:8080'?")
        );
    }

    #[test]
    fn zero_max_body_fails() {
        let mut cfg = config("http://h");
        cfg.max_body = Some(0);
        let errors = validate(&cfg).unwrap_err();
        assert_eq!(errors[0].field, "max_body");
    }

    #[test]
    fn report_lists_settings() {
        let report = format_validation_report("passthru.yaml", &config("http://h"));
        assert!(report.starts_with("passthru.yaml is valid"));
        assert!(report.contains("base_url: http://h"));
        assert!(report.contains("max_body: unlimited"));
    }
}
