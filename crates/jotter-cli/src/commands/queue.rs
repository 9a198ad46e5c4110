use crate::commands::common::{format_unix_millis, Client};
use crate::error::CliError;

pub async fn run_queue(client: &Client, as_json: bool) -> Result<(), CliError> {
    let operations = client.store().queue().get_all().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&operations)?);
        return Ok(());
    }

    if operations.is_empty() {
        println!("No pending changes.");
        return Ok(());
    }

    for operation in &operations {
        println!(
            "{:<6}  {:<6}  {:<40}  retries={}  queued={}",
            operation.kind(),
            operation.method.to_string(),
            operation.endpoint,
            operation.retries,
            format_unix_millis(operation.timestamp)
        );
    }
    Ok(())
}
