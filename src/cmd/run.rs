//! `passthru run` — start the proxy server.
//!
//! Resolves the configuration from an optional file plus command-line
//! overrides, validates it, and serves every request by forwarding it to
//! the base URL until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::model::Config;
use crate::config::{self, validation};
use crate::error::PassthruError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), PassthruError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let config = resolve_config(&args).await?;

    let state = Arc::new(AppState::new(config.base_url.clone()));
    let router = server::build_router(state, config.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        base_url = %config.base_url,
        max_body = ?config.max_body,
        "passthru started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("passthru stopped");
    Ok(())
}

async fn resolve_config(args: &RunArgs) -> Result<Config, PassthruError> {
    let file_config = match resolve_config_path(args.config.as_deref()).await {
        Some(path) => config::load_file(&path).await?,
        None => Config::default(),
    };

    let config = file_config.with_overrides(args.base_url.as_deref(), args.max_body);

    if config.base_url.is_empty() {
        return Err(PassthruError::NoBaseUrl {
            hint: "Provide --base-url <url>, set BASE_URL, or add base_url to passthru.yaml."
                .into(),
        });
    }

    validation::validate(&config).map_err(|errors| PassthruError::ConfigValidation { errors })?;
    Ok(config)
}

async fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    for name in config::CANDIDATE_FILES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Some(path);
        }
    }

    None
}
