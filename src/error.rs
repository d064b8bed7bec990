//! Error taxonomy for the habit engine.
//!
//! Infrastructure code (SQLite, HTTP, config) stays on `anyhow`; everything a
//! caller of the engine can observe goes through [`HabitError`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    /// Bad input, e.g. an empty habit name. No state was changed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown habit id. No state was changed.
    #[error("habit not found: {0}")]
    NotFound(String),

    /// The operation must reach the remote collaborator but no session exists.
    #[error("not authenticated")]
    Unauthenticated,

    /// A timestamp could not be parsed, usually a corrupt persisted record.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A remote push failed. Only ever logged and counted, never returned
    /// from a mutating operation.
    #[error("sync failed: {0}")]
    Sync(String),
}

pub type HabitResult<T> = Result<T, HabitError>;
