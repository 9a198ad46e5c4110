use jotter_core::{ClientError, Note, NoteId, NoteQuery};

use crate::commands::common::{
    connect, find_note, format_timestamp, normalize_note_identifier, note_to_list_item,
    render_tags, Client,
};
use crate::error::CliError;

pub async fn run_show(client: &Client, id: &str, as_json: bool) -> Result<(), CliError> {
    connect(client, &NoteQuery::default()).await?;
    let note = lookup_note(client, id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note_to_list_item(&note))?);
    } else {
        println!("{}", format_note_detail(&note));
    }
    Ok(())
}

/// Local id or prefix first; an unknown full id is fetched from the backend
pub async fn lookup_note(client: &Client, id: &str) -> Result<Note, CliError> {
    let id = normalize_note_identifier(id)?;
    match find_note(&client.store().notes(), &id) {
        Err(CliError::NoteNotFound(_)) => match client.note(&NoteId::new(id.as_str())).await {
            Ok(note) => Ok(note),
            Err(ClientError::NoteNotFound(_)) => Err(CliError::NoteNotFound(id)),
            Err(error) => Err(error.into()),
        },
        found => found,
    }
}

pub fn format_note_detail(note: &Note) -> String {
    let mut meta = vec![
        note.id.to_string(),
        note.visibility.to_string(),
        format!("updated {}", format_timestamp(&note.updated_at)),
    ];
    let tags = render_tags(note);
    if !tags.is_empty() {
        meta.push(tags);
    }
    if note.is_pending_create() {
        meta.push("not synced yet".to_string());
    }

    let mut detail = format!("{}\n{}", note.title, meta.join("  |  "));
    if !note.content_md.is_empty() {
        detail.push_str("\n\n");
        detail.push_str(&note.content_md);
    }
    detail
}
