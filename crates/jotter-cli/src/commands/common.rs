use std::io::{self, BufRead, IsTerminal, Read};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use jotter_core::{
    ClientConfig, HttpNotesApi, LoadOutcome, Note, NoteQuery, NotesClient, SqliteKeyValueStore,
};
use serde::Serialize;

use crate::error::CliError;

pub type Client = NotesClient<HttpNotesApi, SqliteKeyValueStore>;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub content_md: String,
    pub visibility: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub pending: bool,
}

/// Effective config: file, then env vars, then CLI flags
pub fn load_config(
    api_url: Option<String>,
    data_dir: Option<String>,
) -> Result<ClientConfig, CliError> {
    Ok(ClientConfig::load_from_path(&ClientConfig::default_path())?
        .with_env_overrides()
        .with_overrides(api_url, data_dir))
}

pub fn open_client(config: &ClientConfig) -> Result<Client, CliError> {
    let api = HttpNotesApi::from_config(config)?;
    let database_path = config.database_path();
    tracing::debug!("Using {} against {}", database_path.display(), api.base_url());
    let storage = SqliteKeyValueStore::open(database_path)?;
    Ok(NotesClient::new(Arc::new(api), Arc::new(storage)))
}

/// Restore the stored session and decide connectivity with a listing fetch.
///
/// Pending changes are replayed when the backend answers.
pub async fn connect(client: &Client, query: &NoteQuery) -> Result<LoadOutcome, CliError> {
    if !client.restore_session().await {
        return Err(CliError::NotSignedIn);
    }

    let outcome = client.refresh(query).await?;
    if let LoadOutcome::Cached { notes } = outcome {
        eprintln!(
            "Offline: showing {notes} cached notes ({} pending changes)",
            client.store().snapshot().pending_operations_count
        );
    }
    Ok(outcome)
}

pub fn resolve_note(client: &Client, note_query: &str) -> Result<Note, CliError> {
    let note_query = normalize_note_identifier(note_query)?;
    find_note(&client.store().notes(), &note_query)
}

/// Exact id match first, then a unique id prefix
pub fn find_note(notes: &[Note], note_query: &str) -> Result<Note, CliError> {
    if let Some(note) = notes.iter().find(|note| note.id.as_str() == note_query) {
        return Ok(note.clone());
    }

    let matches: Vec<&Note> = notes
        .iter()
        .filter(|note| note.id.as_str().starts_with(note_query))
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query.to_string())),
        [note] => Ok((*note).clone()),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|note| short_id(note))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let marker = if note.is_pending_create() { "*" } else { " " };
            let title = truncate(&note.title, 40);
            let updated = format_timestamp(&note.updated_at);
            let tags = render_tags(note);

            if tags.is_empty() {
                format!("{marker}{:<13}  {title:<40}  {updated}", short_id(note))
            } else {
                format!(
                    "{marker}{:<13}  {title:<40}  {updated:<16}  {tags}",
                    short_id(note)
                )
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        content_md: note.content_md.clone(),
        visibility: note.visibility.to_string(),
        tags: note.tags.clone(),
        created_at: note.created_at.clone(),
        updated_at: note.updated_at.clone(),
        pending: note.is_pending_create(),
    }
}

pub fn short_id(note: &Note) -> String {
    note.id.as_str().chars().take(13).collect()
}

pub fn render_tags(note: &Note) -> String {
    let mut tags = note.tags.clone();
    tags.sort();
    tags.into_iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Render backend (zone-less) or local (RFC 3339) timestamps as `YYYY-MM-DD HH:MM`
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return date_time.format("%Y-%m-%d %H:%M").to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map_or_else(
        |_| raw.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M").to_string(),
    )
}

pub fn format_unix_millis(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Password from the flag, else the first line of stdin
pub fn resolve_password(password: Option<String>) -> Result<String, CliError> {
    let password = if let Some(password) = password {
        password
    } else {
        if io::stdin().is_terminal() {
            eprint!("Password: ");
        }
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string()
    };

    if password.is_empty() {
        Err(CliError::EmptyPassword)
    } else {
        Ok(password)
    }
}
