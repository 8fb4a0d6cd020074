//! Notekeep Core Library
//!
//! Local note storage with live queries. Notes live in a single SQLite
//! table; every committed write re-runs the open queries and pushes fresh
//! snapshots to their subscribers.
//!
//! # Architecture
//!
//! - **Store** (`store::NoteStore`): SQLite connection plus observer registry
//! - **Repository** (`repository::NoteRepository`): storage-agnostic facade
//! - **Use cases** (`use_cases`): async single-purpose operations
//! - **Presentation** (`presentation`): view models holding screen snapshots
//!
//! # Quick Start
//!
//! ```text
//! let app = AppContainer::open()?;
//!
//! // Add a note
//! let id = app.use_cases().add_note.call(Note::new("Title", "Body")).await?;
//!
//! // Follow the list
//! let mut notes = app.use_cases().get_all_notes.call().await?;
//! while let Some(snapshot) = notes.recv().await { ... }
//! ```
//!
//! # Modules
//!
//! - `app`: Composition root (main entry point)
//! - `models`: The note entity
//! - `store`: SQLite store with live queries
//! - `observe`: Subscriptions and the observer registry
//! - `storage`: Schema, row mapping and storage errors
//! - `remote`: Read-only remote notes endpoint
//! - `config`: Application configuration

pub mod app;
pub mod config;
pub mod models;
pub mod observe;
pub mod presentation;
pub mod remote;
pub mod repository;
pub mod storage;
pub mod store;
pub mod use_cases;

pub use app::AppContainer;
pub use config::Config;
pub use models::{Note, NEW_NOTE_ID};
pub use observe::{ObserverId, Subscription};
pub use presentation::{
    BookmarkState, BookmarkViewModel, DetailState, DetailViewModel, HomeState, HomeViewModel,
    ViewState,
};
pub use remote::{NoteApiClient, RemoteError, RemoteNotes};
pub use repository::{LocalNoteRepository, NoteRepository};
pub use storage::{StorageError, StorageResult};
pub use store::NoteStore;
pub use use_cases::UseCases;
