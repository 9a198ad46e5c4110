use jotter_core::{ClientError, Connectivity, NoteQuery};
use serde::Serialize;

use crate::commands::common::Client;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusItem {
    pub signed_in: bool,
    pub email: Option<String>,
    pub connectivity: &'static str,
    pub notes: usize,
    pub pending_operations: usize,
    pub queue_error: Option<String>,
}

pub async fn run_status(client: &Client, as_json: bool) -> Result<(), CliError> {
    let status = collect_status(client).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match &status.email {
        Some(email) => println!("Signed in as {email}"),
        None => println!("Not signed in"),
    }
    println!("Connectivity: {}", status.connectivity);
    println!("Notes: {}", status.notes);
    println!("Pending changes: {}", status.pending_operations);
    if let Some(error) = &status.queue_error {
        println!("Warning: pending queue is unreadable ({error})");
    }
    Ok(())
}

pub async fn collect_status(client: &Client) -> Result<StatusItem, CliError> {
    let signed_in = client.restore_session().await;
    if signed_in {
        match client.load_notes(&NoteQuery::default()).await {
            Ok(_) | Err(ClientError::SessionExpired) => {}
            Err(error) => return Err(error.into()),
        }
    }

    let queue_error = client
        .store()
        .queue()
        .try_get_all()
        .await
        .err()
        .map(|error| error.to_string());
    let state = client.store().snapshot();

    Ok(StatusItem {
        signed_in: state.token.is_some(),
        email: state.user.as_ref().map(|user| user.email.clone()),
        connectivity: match state.connectivity() {
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        },
        notes: state.notes.len(),
        pending_operations: state.pending_operations_count,
        queue_error,
    })
}
