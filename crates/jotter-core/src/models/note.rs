//! Note model (client-local projection of the backend note)

use std::fmt;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::{contains_ignore_case, normalize_text_option};

const TEMP_ID_PREFIX: &str = "temp_";

/// Opaque note identifier.
///
/// Backend-issued ids are kept verbatim. Notes created while offline get a
/// temporary id (`temp_<uuid v7>`) until the backend confirms them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wrap a backend-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a locally unique placeholder id for an unconfirmed note
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Whether this id was generated locally and never confirmed by the backend
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Note visibility as understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Private,
    Shared,
    Public,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Shared => "SHARED",
            Self::Public => "PUBLIC",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRIVATE" => Ok(Self::Private),
            "SHARED" => Ok(Self::Shared),
            "PUBLIC" => Ok(Self::Public),
            other => Err(Error::InvalidInput(format!("unknown visibility '{other}'"))),
        }
    }
}

/// Fields submitted to the backend when creating or updating a note
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub title: String,
    pub content_md: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NotePayload {
    pub fn new(title: impl Into<String>, content_md: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_md: content_md.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Trim text fields and drop blank or duplicate tags.
    ///
    /// Fails when the title is empty after trimming.
    pub fn normalized(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidInput(
                "Note title cannot be empty".to_string(),
            ));
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.to_string());
            }
        }

        Ok(Self {
            title,
            content_md: self.content_md.trim().to_string(),
            visibility: self.visibility,
            tags,
        })
    }
}

/// A note as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub content_md: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Backend timestamps are zone-less ISO strings; kept opaque
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Note {
    /// Build a local note from a payload, stamped with the current time
    pub fn from_draft(id: NoteId, owner_id: impl Into<String>, payload: NotePayload) -> Self {
        let now = local_timestamp();
        Self {
            id,
            owner_id: owner_id.into(),
            title: payload.title,
            content_md: payload.content_md,
            visibility: payload.visibility,
            tags: payload.tags,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Apply an edit locally, keeping identity and creation time
    #[must_use]
    pub fn with_payload(&self, payload: NotePayload) -> Self {
        Self {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            title: payload.title,
            content_md: payload.content_md,
            visibility: payload.visibility,
            tags: payload.tags,
            created_at: self.created_at.clone(),
            updated_at: local_timestamp(),
        }
    }

    /// Whether this note only exists locally so far
    #[must_use]
    pub fn is_pending_create(&self) -> bool {
        self.id.is_temporary()
    }

    /// The editable fields of this note
    #[must_use]
    pub fn payload(&self) -> NotePayload {
        NotePayload {
            title: self.title.clone(),
            content_md: self.content_md.clone(),
            visibility: self.visibility,
            tags: self.tags.clone(),
        }
    }
}

fn local_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A page of notes from the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesPage {
    pub content: Vec<Note>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
}

/// Paging and filter parameters for the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteQuery {
    pub page: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl Default for NoteQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 100,
            query: None,
            visibility: None,
        }
    }
}

impl NoteQuery {
    #[must_use]
    pub fn with_search(mut self, query: Option<String>) -> Self {
        self.query = normalize_text_option(query);
        self
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: Option<Visibility>) -> Self {
        self.visibility = visibility;
        self
    }

    /// Whether this query narrows the listing
    pub const fn is_filtered(&self) -> bool {
        self.query.is_some() || self.visibility.is_some()
    }

    /// Local equivalent of the backend filter: search text in the title or
    /// markdown body, plus an exact visibility match
    pub fn matches(&self, note: &Note) -> bool {
        let text_matches = self.query.as_deref().is_none_or(|query| {
            contains_ignore_case(&note.title, query)
                || contains_ignore_case(&note.content_md, query)
        });
        let visibility_matches = self
            .visibility
            .is_none_or(|visibility| visibility == note.visibility);
        text_matches && visibility_matches
    }
}
