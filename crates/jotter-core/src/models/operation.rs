//! Pending operation model for the offline replay queue

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::note::{NoteId, NotePayload};

pub const NOTES_ENDPOINT: &str = "/notes";

/// Unique identifier of a queued operation, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Create a new unique operation ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// What a queued operation intends to do, with the payload its kind needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum OperationIntent {
    Create { payload: NotePayload },
    Update { payload: NotePayload },
    Delete,
}

impl OperationIntent {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "CREATE",
            Self::Update { .. } => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    pub const fn payload(&self) -> Option<&NotePayload> {
        match self {
            Self::Create { payload } | Self::Update { payload } => Some(payload),
            Self::Delete => None,
        }
    }
}

/// HTTP verb used when replaying an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// An operation to enqueue; the queue assigns id, timestamp and retry count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub intent: OperationIntent,
    pub endpoint: String,
    pub method: HttpMethod,
    pub note_id: Option<NoteId>,
}

impl OperationRequest {
    /// Create a note; `placeholder` is the temporary id shown locally until replay
    pub fn create(placeholder: NoteId, payload: NotePayload) -> Self {
        Self {
            intent: OperationIntent::Create { payload },
            endpoint: NOTES_ENDPOINT.to_string(),
            method: HttpMethod::Post,
            note_id: Some(placeholder),
        }
    }

    pub fn update(note_id: NoteId, payload: NotePayload) -> Self {
        Self {
            intent: OperationIntent::Update { payload },
            endpoint: note_endpoint(&note_id),
            method: HttpMethod::Put,
            note_id: Some(note_id),
        }
    }

    pub fn delete(note_id: NoteId) -> Self {
        Self {
            intent: OperationIntent::Delete,
            endpoint: note_endpoint(&note_id),
            method: HttpMethod::Delete,
            note_id: Some(note_id),
        }
    }
}

/// A durable record of a mutation not yet confirmed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub id: OperationId,
    #[serde(flatten)]
    pub intent: OperationIntent,
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<NoteId>,
    /// Enqueue time (Unix ms); ordering and debugging only
    pub timestamp: i64,
    #[serde(default)]
    pub retries: u32,
}

impl PendingOperation {
    pub(crate) fn from_request(request: OperationRequest, timestamp: i64) -> Self {
        Self {
            id: OperationId::new(),
            intent: request.intent,
            endpoint: request.endpoint,
            method: request.method,
            note_id: request.note_id,
            timestamp,
            retries: 0,
        }
    }

    pub const fn kind(&self) -> &'static str {
        self.intent.kind()
    }

    pub const fn payload(&self) -> Option<&NotePayload> {
        self.intent.payload()
    }

    /// Point this operation at a confirmed note id.
    ///
    /// Only per-note endpoints are rewritten; `CREATE` keeps `/notes`.
    pub(crate) fn retarget(&mut self, from: &NoteId, to: &NoteId) -> bool {
        if self.note_id.as_ref() != Some(from) {
            return false;
        }
        if self.endpoint == note_endpoint(from) {
            self.endpoint = note_endpoint(to);
        }
        self.note_id = Some(to.clone());
        true
    }
}

/// Resource path for a single note
pub fn note_endpoint(note_id: &NoteId) -> String {
    format!("{NOTES_ENDPOINT}/{note_id}")
}
