//! `passthru validate` — check a configuration file for errors.
//!
//! The file is loaded through the same path as `passthru run`, but CLI flags
//! and environment variables are not merged in: a file that leaves
//! `base_url` to the command line is reported as incomplete.

use std::path::Path;

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::load_file;
use crate::config::model::Config;
use crate::config::validation;
use crate::error::{PassthruError, ValidationError};

/// Machine-readable outcome, printed with `--format json`.
#[derive(Debug, Serialize)]
pub struct ValidationReport<'a> {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_body: Option<usize>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub errors: &'a [ValidationError],
}

impl<'a> ValidationReport<'a> {
    fn new(config: &'a Config, errors: &'a [ValidationError]) -> Self {
        if errors.is_empty() {
            Self {
                valid: true,
                base_url: Some(&config.base_url),
                max_body: config.max_body,
                errors,
            }
        } else {
            Self {
                valid: false,
                base_url: None,
                max_body: None,
                errors,
            }
        }
    }
}

pub async fn execute(args: &ValidateArgs) -> Result<(), PassthruError> {
    let path = args.config.as_path();
    let config = load_file(path).await?;
    let errors = validation::validate(&config).err().unwrap_or_default();
    let report = ValidationReport::new(&config, &errors);

    match args.format {
        ValidateFormat::Text if report.valid => println!("{}", render_text(path, &config, &report)),
        ValidateFormat::Text => eprintln!("{}", render_text(path, &config, &report)),
        ValidateFormat::Json => {
            let json = serde_json::to_string(&report).map_err(std::io::Error::from)?;
            println!("{json}");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PassthruError::ConfigValidation { errors })
    }
}

fn render_text(path: &Path, config: &Config, report: &ValidationReport<'_>) -> String {
    let display = path.display().to_string();
    if report.valid {
        return format!(
            "\u{2713} {}",
            validation::format_validation_report(&display, config)
        );
    }

    let mut out = format!("\u{2717} {display} has {} errors\n", report.errors.len());
    for error in report.errors {
        out.push('\n');
        out.push_str(&error.to_string());
    }
    out
}
