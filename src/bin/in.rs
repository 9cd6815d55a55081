use anyhow::Context;

use slack_chat_resource::cli;
use slack_chat_resource::protocol::InRequest;
use slack_chat_resource::resource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::init_tracing();

    let destination = cli::directory_arg("destination")?;
    let request: InRequest = cli::read_request().context("parsing request")?;
    let client = resource::connect(&request.source)?;

    let response = resource::fetch(&client, &request, &destination)
        .await
        .context("getting message")?;
    cli::write_response(&response)
}
