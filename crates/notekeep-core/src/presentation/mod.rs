//! Screen state holders
//!
//! Each view model owns a `StateContainer` with an immutable snapshot of its
//! screen, kept current by background tasks that collect live queries.
//! Dropping a view model cancels those tasks.

pub mod bookmark;
pub mod detail;
pub mod home;
pub mod state;

pub use bookmark::{BookmarkState, BookmarkViewModel};
pub use detail::{DetailState, DetailViewModel};
pub use home::{HomeState, HomeViewModel};
pub use state::{StateContainer, TaskScope, ViewState};
