use thiserror::Error;

/// Errors raised while loading catalogs, configuration, or touching durable storage.
#[derive(Error, Debug)]
pub enum PracticError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid task '{task}': {reason}")]
    InvalidTask { task: String, reason: String },

    #[error("duplicate task identifier: {0}")]
    DuplicateTask(String),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("bundled catalog not found: {0}")]
    MissingCatalog(String),
}

impl PracticError {
    pub fn invalid_task<T: Into<String>, R: Into<String>>(task: T, reason: R) -> Self {
        Self::InvalidTask {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PracticError>;
