use anyhow::Context;

use slack_chat_resource::cli;
use slack_chat_resource::protocol::CheckRequest;
use slack_chat_resource::resource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::init_tracing();

    let request: CheckRequest = cli::read_request().context("parsing request")?;
    let client = resource::connect(&request.source)?;

    let versions = resource::check(&client, &request)
        .await
        .context("checking for new messages")?;
    cli::write_response(&versions)
}
