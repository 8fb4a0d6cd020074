//! Composition root
//!
//! Builds the store, repository, use cases and remote list once and hands
//! out shared handles. Everything above the store talks to the repository
//! through `Arc<dyn NoteRepository>`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::presentation::{BookmarkViewModel, DetailViewModel, HomeViewModel};
use crate::remote::{NoteApiClient, RemoteNotes};
use crate::repository::{LocalNoteRepository, NoteRepository};
use crate::store::NoteStore;
use crate::use_cases::UseCases;

/// Application-wide shared services
#[derive(Clone)]
pub struct AppContainer {
    config: Config,
    store: NoteStore,
    repository: Arc<dyn NoteRepository>,
    use_cases: UseCases,
    remote: RemoteNotes,
}

impl AppContainer {
    /// Load configuration from the default locations and open the store
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::with_config(config)
    }

    /// Open the store described by `config`
    pub fn with_config(config: Config) -> Result<Self> {
        let store = NoteStore::open(&config).map_err(|e| {
            let mut message = format!("Failed to open note store at {:?}", config.sqlite_path());
            if let Some(hint) = e.recovery_suggestion() {
                message.push_str(". ");
                message.push_str(hint);
            }
            anyhow::Error::new(e).context(message)
        })?;
        let remote = remote_notes(&config);
        info!(data_dir = ?config.data_dir, remote = remote.is_enabled(), "Application ready");
        Ok(Self::assemble(config, store, remote))
    }

    /// In-memory store with remote disabled
    pub fn in_memory() -> Result<Self> {
        let store = NoteStore::open_in_memory().context("Failed to open in-memory store")?;
        Ok(Self::from_store(Config::default(), store))
    }

    /// Wire the services over an already-open store
    pub fn from_store(config: Config, store: NoteStore) -> Self {
        let remote = remote_notes(&config);
        Self::assemble(config, store, remote)
    }

    fn assemble(config: Config, store: NoteStore, remote: RemoteNotes) -> Self {
        let repository: Arc<dyn NoteRepository> =
            Arc::new(LocalNoteRepository::new(store.clone()));
        let use_cases = UseCases::new(Arc::clone(&repository));
        Self {
            config,
            store,
            repository,
            use_cases,
            remote,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn repository(&self) -> Arc<dyn NoteRepository> {
        Arc::clone(&self.repository)
    }

    pub fn use_cases(&self) -> &UseCases {
        &self.use_cases
    }

    pub fn remote(&self) -> &RemoteNotes {
        &self.remote
    }

    pub fn home_view_model(&self) -> HomeViewModel {
        HomeViewModel::new(self.use_cases.clone(), self.remote.clone())
    }

    pub fn bookmark_view_model(&self) -> BookmarkViewModel {
        BookmarkViewModel::new(self.use_cases.clone())
    }

    /// Editor for a new note (`None`) or an existing one
    pub fn detail_view_model(&self, note_id: Option<i64>) -> DetailViewModel {
        DetailViewModel::new(self.use_cases.clone(), note_id)
    }
}

/// Remote list for the configured endpoint; a bad URL disables it
fn remote_notes(config: &Config) -> RemoteNotes {
    let Some(url) = config.remote_url.as_deref() else {
        return RemoteNotes::disabled();
    };

    match NoteApiClient::new(url, config.remote_timeout()) {
        Ok(client) => RemoteNotes::new(Some(client)),
        Err(e) => {
            warn!(error = %e, "Remote notes disabled");
            RemoteNotes::disabled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;
    use tempfile::TempDir;

    #[test]
    fn test_with_config_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp_dir.path().join("data"));

        let app = AppContainer::with_config(config).unwrap();

        assert!(temp_dir.path().join("data/notes_db.sqlite").exists());
        assert!(!app.remote().is_enabled());
    }

    #[test]
    fn test_open_failure_carries_recovery_hint() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let err = AppContainer::with_config(Config::with_data_dir(blocker.join("data")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("write permissions"));
    }

    #[test]
    fn test_invalid_remote_url_disables_remote() {
        let mut config = Config::default();
        config.remote_url = Some("not a url".to_string());
        let app = AppContainer::from_store(config, NoteStore::open_in_memory().unwrap());
        assert!(!app.remote().is_enabled());

        let mut config = Config::default();
        config.remote_url = Some("http://localhost:9".to_string());
        let app = AppContainer::from_store(config, NoteStore::open_in_memory().unwrap());
        assert!(app.remote().is_enabled());
    }

    #[tokio::test]
    async fn test_services_share_one_store() {
        let app = AppContainer::in_memory().unwrap();

        let id = app
            .use_cases()
            .add_note
            .call(Note::new("shared", "c"))
            .await
            .unwrap();

        assert!(app.store().get_by_id(id).unwrap().is_some());

        let mut subscription = app.repository().get_note_by_id(id).unwrap();
        let note = subscription.try_recv().unwrap().unwrap();
        assert_eq!(note.title, "shared");
    }

    #[tokio::test]
    async fn test_view_models_see_writes() {
        let app = AppContainer::in_memory().unwrap();
        let home = app.home_view_model();
        let bookmarks = app.bookmark_view_model();
        let mut home_rx = home.subscribe();
        let mut bookmark_rx = bookmarks.subscribe();

        let detail = app.detail_view_model(None);
        detail.on_title_change("From editor");
        detail.on_content_change("Body");
        detail.on_bookmark_change(true);
        detail.add_or_update_note().await.unwrap().unwrap();

        home_rx
            .wait_for(|s| s.notes.data().is_some_and(|n| n.len() == 1))
            .await
            .unwrap();
        bookmark_rx
            .wait_for(|s| s.notes.data().is_some_and(|n| n.len() == 1))
            .await
            .unwrap();
    }
}
