use jotter_core::NoteQuery;

use crate::cli::VisibilityArg;
use crate::commands::common::{
    connect, format_note_lines, note_to_list_item, Client, NoteListItem,
};
use crate::error::CliError;

pub async fn run_list(
    client: &Client,
    query: Option<String>,
    visibility: Option<VisibilityArg>,
    as_json: bool,
) -> Result<(), CliError> {
    let query = NoteQuery::default()
        .with_search(query)
        .with_visibility(visibility.map(Into::into));
    connect(client, &query).await?;
    let notes = client.store().notes();

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes yet.");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
