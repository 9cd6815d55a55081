use anyhow::Context;

use slack_chat_resource::cli;
use slack_chat_resource::protocol::OutRequest;
use slack_chat_resource::resource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::init_tracing();

    let source_dir = cli::directory_arg("source")?;
    let request: OutRequest = cli::read_request().context("parsing request")?;
    let client = resource::connect(&request.source)?;

    let response = resource::post(&client, &request, &source_dir)
        .await
        .context("sending message")?;
    cli::write_response(&response)
}
