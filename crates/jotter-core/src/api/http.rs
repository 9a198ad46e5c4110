//! reqwest implementation of the notes API

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, NotesApi};
use crate::config::{normalize_api_base_url, ClientConfig};
use crate::error::{Error, Result};
use crate::models::{
    note_endpoint, AuthResponse, HttpMethod, Note, NoteId, NotePayload, NoteQuery, NotesPage,
};

#[derive(Clone)]
pub struct HttpNotesApi {
    base_url: String,
    client: Client,
}

impl fmt::Debug for HttpNotesApi {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpNotesApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl HttpNotesApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_api_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("Failed to build HTTP client: {error}")))?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_base_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.authenticate("/auth/login", email, password).await
    }

    pub async fn register(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.authenticate("/auth/register", email, password).await
    }

    async fn authenticate(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse> {
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&Credentials {
                email: email.trim(),
                password,
            });
        let response = send_checked(request).await?;
        Ok(response.json::<AuthResponse>().await?)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn request(&self, method: HttpMethod, endpoint: &str, token: Option<&str>) -> RequestBuilder {
        let url = self.url(endpoint);
        let request = match method {
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };
        authorize(request, token)
    }
}

impl NotesApi for HttpNotesApi {
    async fn list_notes(&self, token: Option<&str>, query: &NoteQuery) -> ApiResult<NotesPage> {
        let request = authorize(self.client.get(self.url("/notes")), token).query(query);
        let response = send_checked(request).await?;
        Ok(response.json::<NotesPage>().await?)
    }

    async fn get_note(&self, token: Option<&str>, note_id: &NoteId) -> ApiResult<Note> {
        let request = authorize(self.client.get(self.url(&note_endpoint(note_id))), token);
        let response = send_checked(request).await?;
        Ok(response.json::<Note>().await?)
    }

    async fn send(
        &self,
        token: Option<&str>,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&NotePayload>,
    ) -> ApiResult<Option<Note>> {
        let mut request = self.request(method, endpoint, token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = send_checked(request).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|error| ApiError::InvalidPayload(error.to_string()))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidPayload(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    let request = request.header("Accept", "application/json");
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn send_checked(request: RequestBuilder) -> ApiResult<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(
        status.as_u16(),
        parse_api_error(status, &body),
    ))
}

const MAX_ERROR_MESSAGE_CHARS: usize = 180;

/// Collapse whitespace and cap length so raw error bodies stay one line
fn compact_text(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<serde_json::Value>,
    error: Option<String>,
}

/// Pull a readable message out of an error body; validation errors may send
/// `message` as a list
fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let message = match payload.message {
            Some(serde_json::Value::String(message)) => Some(message),
            Some(serde_json::Value::Array(messages)) => Some(
                messages
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
        .or(payload.error);

        if let Some(message) = message.filter(|message| !message.trim().is_empty()) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
    } else {
        trimmed
    }
}
