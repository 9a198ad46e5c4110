use jotter_core::{DeleteOutcome, NoteQuery};

use crate::commands::common::{connect, resolve_note, Client};
use crate::error::CliError;

pub async fn run_delete(client: &Client, id: &str) -> Result<(), CliError> {
    connect(client, &NoteQuery::default()).await?;
    let note = resolve_note(client, id)?;

    let outcome = client.delete_note(&note.id).await?;
    println!("{}", note.id);
    if outcome == DeleteOutcome::Queued {
        eprintln!("Deleted locally; it will sync once the backend is reachable.");
    }
    Ok(())
}
