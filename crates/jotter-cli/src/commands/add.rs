use jotter_core::{NotePayload, NoteQuery, SaveOutcome};

use crate::cli::VisibilityArg;
use crate::commands::common::{connect, parse_tags, read_piped_stdin, Client};
use crate::error::CliError;

pub async fn run_add(
    client: &Client,
    title: &str,
    content: Option<String>,
    tags: Option<&str>,
    visibility: VisibilityArg,
) -> Result<(), CliError> {
    let content = match content {
        Some(content) => content,
        None => read_piped_stdin()?.unwrap_or_default(),
    };
    let payload = NotePayload::new(title, content)
        .with_visibility(visibility.into())
        .with_tags(tags.map(parse_tags).unwrap_or_default());

    connect(client, &NoteQuery::default()).await?;
    let outcome = client.create_note(payload).await?;

    println!("{}", outcome.note().id);
    if matches!(outcome, SaveOutcome::Queued(_)) {
        eprintln!("Saved locally; it will sync once the backend is reachable.");
    }
    Ok(())
}
