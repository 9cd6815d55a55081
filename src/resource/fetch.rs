//! `in`: retrieve the requested message and write its parts to disk.
//!
//! Parts are written as `part0`, `part1`, ... under the destination
//! directory, in the order produced by [`decompose`].

use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::chat::{ChatApi, HistoryQuery, Message};
use crate::decompose::decompose;
use crate::error::{ConfigError, Error, NoMatchError, Result};
use crate::protocol::{InRequest, InResponse, Timestamp};

pub async fn fetch(api: &dyn ChatApi, request: &InRequest, destination: &Path) -> Result<InResponse> {
    request.source.validate()?;

    let version = request
        .version
        .as_ref()
        .ok_or_else(|| ConfigError::missing("version", "timestamp"))?;
    let requested = version
        .requested_timestamp()
        .ok_or_else(|| ConfigError::missing("version", "timestamp"))?;
    info!(version = requested, "Fetching requested version");

    let message = find_message(api, &request.source.channel_id, requested).await?;

    let parts = decompose(&message.text, request.source.filter.as_ref()).ok_or_else(|| {
        NoMatchError::PatternMismatch {
            timestamp: requested.to_string(),
        }
    })?;
    info!(parts = parts.len(), "Message parsed: {}", parts.join(", "));

    write_parts(destination, &parts).await?;

    Ok(InResponse {
        version: version.clone(),
    })
}

/// The message posted exactly at `ts`.
async fn find_message(api: &dyn ChatApi, channel_id: &str, ts: &str) -> Result<Message> {
    let wanted = Timestamp::parse(ts)?;
    let query = HistoryQuery {
        oldest: None,
        latest: Some(ts.to_string()),
        inclusive: true,
        limit: 1,
    };

    let history = api.fetch_history(channel_id, &query).await?;
    history
        .into_iter()
        .next()
        .filter(|m| Timestamp::parse(&m.ts).is_ok_and(|found| found == wanted))
        .ok_or_else(|| {
            NoMatchError::MessageNotFound {
                timestamp: ts.to_string(),
            }
            .into()
        })
}

async fn write_parts(destination: &Path, parts: &[String]) -> Result<()> {
    fs::create_dir_all(destination)
        .await
        .map_err(|source| Error::Io {
            path: destination.to_path_buf(),
            source,
        })?;

    for (i, part) in parts.iter().enumerate() {
        let path = destination.join(format!("part{i}"));
        fs::write(&path, part).await.map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}
