//! Traits for the remote collaborators a session talks to.

use async_trait::async_trait;

use crate::error::AppError;
use crate::model::{ScoreEntry, ScoreRecord};

/// Append-only log of recorded scores.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Appends one row. On error nothing is assumed to have been written.
    async fn append(&self, entry: &ScoreEntry) -> Result<(), AppError>;

    /// Returns every recorded row, or a schema error if the log's header
    /// lacks a required column.
    async fn read_all(&self) -> Result<Vec<ScoreRecord>, AppError>;
}

/// Read-only list of subjects offered for selection.
#[async_trait]
pub trait SubjectCatalog: Send + Sync {
    /// Returns the non-blank subject names in catalog order.
    async fn subjects(&self) -> Result<Vec<String>, AppError>;
}
