//! The three resource directions.
//!
//! - `check` — list new versions
//! - `fetch` — `in`: retrieve one version and write its parts
//! - `post` — `out`: send a templated message

pub mod check;
pub mod fetch;
pub mod post;

use crate::chat::SlackClient;
use crate::error::ConfigError;
use crate::protocol::Source;

pub use check::check;
pub use fetch::fetch;
pub use post::post;

/// Validate the source and build a Slack client for it.
pub fn connect(source: &Source) -> Result<SlackClient, ConfigError> {
    let token = source.validate()?;
    Ok(SlackClient::from_env(token.clone()))
}
