//! Remote notes endpoint
//!
//! Reads `GET {base_url}/notes`, a JSON array of notes. The result feeds a
//! display-only list (`RemoteNotes`) and is never written to the local
//! store. Fetch failures are logged and dropped: the list simply keeps its
//! previous value.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::Note;

/// Errors talking to the remote endpoint
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Base URL is empty or not http(s)
    #[error("Invalid remote URL '{0}': expected http:// or https://")]
    InvalidUrl(String),

    /// Request, status or body decoding failure
    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for the remote notes endpoint
#[derive(Debug, Clone)]
pub struct NoteApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl NoteApiClient {
    /// Create a client for `base_url` with a request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::InvalidUrl(base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("notekeep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// URL of the notes collection
    pub fn notes_url(&self) -> String {
        format!("{}/notes", self.base_url)
    }

    /// Fetch all remote notes
    pub async fn get_notes(&self) -> Result<Vec<Note>, RemoteError> {
        let notes = self
            .client
            .get(self.notes_url())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Note>>()
            .await?;
        Ok(notes)
    }
}

/// Display-only list of notes fetched from the remote endpoint
#[derive(Clone)]
pub struct RemoteNotes {
    client: Option<NoteApiClient>,
    notes: Arc<watch::Sender<Vec<Note>>>,
}

impl RemoteNotes {
    pub fn new(client: Option<NoteApiClient>) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            client,
            notes: Arc::new(tx),
        }
    }

    /// No endpoint configured; `fetch` does nothing
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Current list (empty until a fetch succeeds)
    pub fn snapshot(&self) -> Vec<Note> {
        self.notes.borrow().clone()
    }

    /// Receiver notified when a fetch replaces the list
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.notes.subscribe()
    }

    /// Fetch and publish the remote list; failures are swallowed
    ///
    /// Returns whether the list was replaced.
    pub async fn fetch(&self) -> bool {
        let Some(client) = &self.client else {
            debug!("Remote notes disabled, skipping fetch");
            return false;
        };

        match client.get_notes().await {
            Ok(notes) => {
                debug!(count = notes.len(), "Fetched remote notes");
                self.notes.send_replace(notes);
                true
            }
            Err(e) => {
                warn!(error = %e, url = %client.notes_url(), "Remote notes fetch failed");
                false
            }
        }
    }
}
