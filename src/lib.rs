//! passthru is a thin streaming HTTP forwarding proxy.
//!
//! Every inbound request is replayed against a single base URL: the body
//! is buffered once, method, raw path, query and headers are copied, and
//! the backend response is streamed back with a flush after every chunk so
//! server-sent events and long polls reach the caller as they are produced.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, health).
//! - [`config`] -- Config file parsing, CLI overrides, and validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`forward`] -- Core forwarding: body capture, header copy, dispatch,
//!   and chunked response streaming through a [`ResponseSink`](forward::ResponseSink).
//! - [`health`] -- Health endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod forward;
pub mod health;
pub mod logging;
pub mod server;
