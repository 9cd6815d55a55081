//! `out`: build a message from templates in the source directory and post it.

use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::chat::ChatApi;
use crate::error::{ConfigError, InterpolationError, Result};
use crate::interpolate::{EnvSource, Interpolator};
use crate::message::OutMessage;
use crate::protocol::{OutParams, OutRequest, OutResponse, Version};

pub async fn post(api: &dyn ChatApi, request: &OutRequest, source_dir: &Path) -> Result<OutResponse> {
    post_with(api, request, &Interpolator::new(source_dir)).await
}

/// [`post`] with an explicit interpolator.
pub async fn post_with<E: EnvSource>(
    api: &dyn ChatApi,
    request: &OutRequest,
    interp: &Interpolator<E>,
) -> Result<OutResponse> {
    request.source.validate()?;

    let message = load_message(&request.params, interp).await?;
    if let Ok(pretty) = serde_json::to_string_pretty(&message) {
        info!("Sending message:\n{pretty}");
    }

    let ts = api
        .post_message(&request.source.channel_id, &message)
        .await?;
    info!(ts = %ts, "Message sent");

    Ok(OutResponse {
        version: Version::from_timestamp(ts),
    })
}

/// The message to send: `message_file` read verbatim, or the inline
/// `message` with placeholders expanded.
async fn load_message<E: EnvSource>(
    params: &OutParams,
    interp: &Interpolator<E>,
) -> Result<OutMessage> {
    if let Some(file) = params.message_file.as_deref().filter(|f| !f.is_empty()) {
        let path = interp.base_dir().join(file);
        let raw = fs::read_to_string(&path).await.map_err(|source| {
            InterpolationError::FileRead {
                path: path.clone(),
                source,
            }
        })?;
        let message = serde_json::from_str(&raw).map_err(|e| {
            InterpolationError::InvalidMessageFile {
                path,
                reason: e.to_string(),
            }
        })?;
        return Ok(message);
    }

    let mut message = params
        .message
        .clone()
        .ok_or_else(|| ConfigError::missing("params", "message or message_file"))?;
    message.interpolate(interp)?;
    Ok(message)
}
