//! Data models for Jotter

mod note;
mod operation;
mod user;

pub use note::{Note, NoteId, NotePayload, NoteQuery, NotesPage, Visibility};
pub use operation::{
    note_endpoint, HttpMethod, OperationId, OperationIntent, OperationRequest, PendingOperation,
    NOTES_ENDPOINT,
};
pub use user::{AuthResponse, User};
