//! Process glue shared by the `check`, `in` and `out` binaries.
//!
//! stdout carries only the response document, so logs go to stderr.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::protocol::parse_request;

/// Install the stderr tracing subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Read and decode the request document from stdin.
pub fn read_request<T: DeserializeOwned>() -> Result<T, ConfigError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Write the response document to stdout.
pub fn write_response<T: Serialize>(response: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, response).context("encoding response")?;
    writeln!(stdout).context("writing response")?;
    Ok(())
}

/// The directory passed as the first argument.
pub fn directory_arg(name: &str) -> anyhow::Result<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .with_context(|| {
            let program = std::env::args().next().unwrap_or_default();
            format!("usage: {program} <{name}>")
        })
}
