//! Test doubles shared by unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::api::{ApiError, ApiResult, NotesApi};
use crate::error::{Error, Result};
use crate::models::{HttpMethod, Note, NoteId, NotePayload, NoteQuery, NotesPage};
use crate::storage::{KeyValueStore, SqliteKeyValueStore};

/// A store whose every call fails
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("storage unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("storage unavailable".to_string()))
    }

    async fn remove(&self, _keys: &[&str]) -> Result<()> {
        Err(Error::Storage("storage unavailable".to_string()))
    }
}

/// An in-memory store whose next `get` can be made to fail once
pub struct FlakyStore {
    inner: SqliteKeyValueStore,
    fail_next_get: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteKeyValueStore::open_in_memory().unwrap(),
            fail_next_get: AtomicBool::new(false),
        }
    }

    pub fn fail_next_get(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_next_get.swap(false, Ordering::SeqCst) {
            return Err(Error::Storage("transient read failure".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        self.inner.remove(keys).await
    }
}

/// Notes API fake answering from scripted responses.
///
/// Unscripted listing calls return an empty page, unscripted note fetches
/// answer 404 and unscripted mutations succeed with no body.
#[derive(Default)]
pub struct ScriptedApi {
    list_responses: Mutex<VecDeque<ApiResult<NotesPage>>>,
    get_responses: Mutex<VecDeque<ApiResult<Note>>>,
    send_responses: Mutex<VecDeque<ApiResult<Option<Note>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, response: ApiResult<NotesPage>) -> &Self {
        self.list_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_get(&self, response: ApiResult<Note>) -> &Self {
        self.get_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_send(&self, response: ApiResult<Option<Note>>) -> &Self {
        self.send_responses.lock().unwrap().push_back(response);
        self
    }

    /// Every call made, as `"METHOD endpoint"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("GET "))
            .collect()
    }
}

impl NotesApi for ScriptedApi {
    async fn list_notes(&self, _token: Option<&str>, _query: &NoteQuery) -> ApiResult<NotesPage> {
        self.calls.lock().unwrap().push("GET /notes".to_string());
        self.list_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(NotesPage::default()))
    }

    async fn get_note(&self, _token: Option<&str>, note_id: &NoteId) -> ApiResult<Note> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("GET /notes/{note_id}"));
        self.get_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::from_status(404, "Note not found")))
    }

    async fn send(
        &self,
        _token: Option<&str>,
        method: HttpMethod,
        endpoint: &str,
        _body: Option<&NotePayload>,
    ) -> ApiResult<Option<Note>> {
        self.calls.lock().unwrap().push(format!("{method} {endpoint}"));
        self.send_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

/// A server-side note
pub fn remote_note(id: &str, title: &str) -> Note {
    let mut note = Note::from_draft(NoteId::new(id), "u-1", NotePayload::new(title, "body"));
    note.created_at = "2024-05-01T10:00:00".to_string();
    note.updated_at = note.created_at.clone();
    note
}

pub fn page(notes: Vec<Note>) -> NotesPage {
    NotesPage {
        total_elements: Some(notes.len() as u64),
        total_pages: 1,
        page: 0,
        size: 100,
        content: notes,
    }
}
