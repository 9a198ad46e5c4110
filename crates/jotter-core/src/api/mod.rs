//! Backend collaborator: the notes REST API seen through the BFF.

mod http;

pub use http::HttpNotesApi;

use thiserror::Error;

use crate::models::{
    note_endpoint, HttpMethod, Note, NoteId, NotePayload, NoteQuery, NotesPage, OperationIntent,
    PendingOperation, NOTES_ENDPOINT,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401/403: the session token is missing, expired or rejected
    #[error("Session rejected by backend: {message} ({status})")]
    Unauthorized { status: u16, message: String },
    /// Connection failure or timeout
    #[error("Backend unreachable: {0}")]
    Network(String),
    /// 5xx
    #[error("Backend error: {message} ({status})")]
    Server { status: u16, message: String },
    /// Any other non-success status
    #[error("Request rejected: {message} ({status})")]
    Rejected { status: u16, message: String },
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Rejected { status, message },
        }
    }

    /// Terminal for the current session
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The backend could not be reached or failed on its side
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }

    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. }
            | Self::Server { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
            Self::Network(_) | Self::InvalidPayload(_) => None,
        }
    }
}

/// Notes API capability.
///
/// Implementations provide the two read calls and a generic `send`;
/// create/update/delete and queue replay are expressed on top of it so that
/// a replayed operation reproduces exactly the call that was queued.
#[allow(async_fn_in_trait)]
pub trait NotesApi {
    /// Fetch one page of the note listing
    async fn list_notes(&self, token: Option<&str>, query: &NoteQuery) -> ApiResult<NotesPage>;

    /// Fetch a single note by id
    async fn get_note(&self, token: Option<&str>, note_id: &NoteId) -> ApiResult<Note>;

    /// Issue `method` against `endpoint`, returning the note body if any
    async fn send(
        &self,
        token: Option<&str>,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&NotePayload>,
    ) -> ApiResult<Option<Note>>;

    async fn create_note(
        &self,
        token: Option<&str>,
        payload: &NotePayload,
    ) -> ApiResult<Option<Note>> {
        self.send(token, HttpMethod::Post, NOTES_ENDPOINT, Some(payload))
            .await
    }

    async fn update_note(
        &self,
        token: Option<&str>,
        note_id: &NoteId,
        payload: &NotePayload,
    ) -> ApiResult<Option<Note>> {
        self.send(token, HttpMethod::Put, &note_endpoint(note_id), Some(payload))
            .await
    }

    async fn delete_note(&self, token: Option<&str>, note_id: &NoteId) -> ApiResult<()> {
        self.send(token, HttpMethod::Delete, &note_endpoint(note_id), None)
            .await
            .map(|_| ())
    }

    /// Replay a queued operation with its stored method, endpoint and payload
    async fn replay(
        &self,
        token: Option<&str>,
        operation: &PendingOperation,
    ) -> ApiResult<Option<Note>> {
        let body = match &operation.intent {
            OperationIntent::Create { payload } | OperationIntent::Update { payload } => {
                Some(payload)
            }
            OperationIntent::Delete => None,
        };
        self.send(token, operation.method, &operation.endpoint, body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(ApiError::from_status(401, "expired").is_auth_failure());
        assert!(ApiError::from_status(403, "forbidden").is_auth_failure());
        assert!(ApiError::from_status(503, "down").is_transient());
        assert!(!ApiError::from_status(404, "gone").is_transient());
        assert!(!ApiError::from_status(422, "bad").is_auth_failure());
        assert!(ApiError::Network("refused".to_string()).is_transient());
        assert_eq!(ApiError::from_status(409, "conflict").status(), Some(409));
        assert!(ApiError::from_status(404, "gone").is_not_found());
        assert!(!ApiError::from_status(410, "gone").is_not_found());
    }
}
