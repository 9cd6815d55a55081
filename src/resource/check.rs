//! `check`: detect new versions in the channel.

use crate::chat::ChatApi;
use crate::error::Result;
use crate::protocol::{CheckRequest, CheckResponse};
use crate::scanner::VersionScanner;

pub async fn check(api: &dyn ChatApi, request: &CheckRequest) -> Result<CheckResponse> {
    request.source.validate()?;
    request.source.log_filters();

    let versions = VersionScanner::new(api, &request.source)
        .scan(request.version.as_ref())
        .await?;
    Ok(versions)
}
