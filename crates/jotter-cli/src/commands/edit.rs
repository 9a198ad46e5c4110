use jotter_core::{NoteQuery, SaveOutcome};

use crate::cli::VisibilityArg;
use crate::commands::common::{connect, parse_tags, resolve_note, Client};
use crate::error::CliError;

pub async fn run_edit(
    client: &Client,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    tags: Option<&str>,
    visibility: Option<VisibilityArg>,
) -> Result<(), CliError> {
    connect(client, &NoteQuery::default()).await?;
    let note = resolve_note(client, id)?;

    let mut payload = note.payload();
    if let Some(title) = title {
        payload.title = title;
    }
    if let Some(content) = content {
        payload.content_md = content;
    }
    if let Some(tags) = tags {
        payload.tags = parse_tags(tags);
    }
    if let Some(visibility) = visibility {
        payload.visibility = visibility.into();
    }

    if payload == note.payload() {
        println!("{}", note.id);
        return Ok(());
    }

    let outcome = client.update_note(&note.id, payload).await?;
    println!("{}", outcome.note().id);
    if matches!(outcome, SaveOutcome::Queued(_)) {
        eprintln!("Saved locally; it will sync once the backend is reachable.");
    }
    Ok(())
}
