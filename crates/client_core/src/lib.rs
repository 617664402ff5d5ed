//! Client core for the answer-sheet evaluation service: the HTTP client,
//! the evaluation session, the history list and the result view models.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod presentation;
pub mod session;
pub mod store;

pub use api::{EvaluationApi, HttpEvaluationClient, DEFAULT_HISTORY_LIMIT};
pub use config::{load_settings, ClientSettings};
pub use error::EvaluationError;
pub use history::{HistoryController, HistorySnapshot, LoadKind};
pub use presentation::{HistoryListView, HistoryScreen, ResultView, ScreenView};
pub use session::{
    BackDisposition, BackTrigger, EvaluationSession, SessionSnapshot, SessionState,
};
pub use store::{HistoryStore, NoopHistoryStore};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
