//! Error types for progress persistence and the progress store.

use forge_shared::CurriculumError;
use thiserror::Error;

/// Failure reported by a persistence adapter. Opaque to the store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistenceError {
    /// Worth retrying the triggering action later
    pub fn is_retryable(&self) -> bool {
        match self {
            PersistenceError::Unavailable(_) | PersistenceError::Io(_) => true,
            PersistenceError::Sqlite(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
            ),
            PersistenceError::Corrupt(_)
            | PersistenceError::Json(_)
            | PersistenceError::Internal(_) => false,
        }
    }
}

/// Steps of the lesson-completion sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStep {
    RecordCompletion,
    MarkCompleted,
    CreditStars,
    UpdateStreak,
    UnlockNext,
    DailyTask,
    Badges,
    LevelUp,
    Reload,
    ClearCurrent,
}

impl CompletionStep {
    pub const ALL: [CompletionStep; 10] = [
        CompletionStep::RecordCompletion,
        CompletionStep::MarkCompleted,
        CompletionStep::CreditStars,
        CompletionStep::UpdateStreak,
        CompletionStep::UnlockNext,
        CompletionStep::DailyTask,
        CompletionStep::Badges,
        CompletionStep::LevelUp,
        CompletionStep::Reload,
        CompletionStep::ClearCurrent,
    ];

    /// Steps with a non-idempotent effect, skipped when a completion is replayed
    pub fn is_one_shot(&self) -> bool {
        matches!(
            self,
            CompletionStep::RecordCompletion
                | CompletionStep::MarkCompleted
                | CompletionStep::CreditStars
                | CompletionStep::UpdateStreak
                | CompletionStep::DailyTask
        )
    }
}

impl std::fmt::Display for CompletionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RecordCompletion => "record completion",
            Self::MarkCompleted => "mark completed",
            Self::CreditStars => "credit stars",
            Self::UpdateStreak => "update streak",
            Self::UnlockNext => "unlock next lesson",
            Self::DailyTask => "daily task",
            Self::Badges => "badge check",
            Self::LevelUp => "level-up check",
            Self::Reload => "reload",
            Self::ClearCurrent => "clear current lesson",
        };
        f.write_str(s)
    }
}

/// Failure of a progress store action
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Lesson completion for {lesson_id} stopped at step '{step}': {source}")]
    Completion {
        lesson_id: String,
        step: CompletionStep,
        /// Steps already applied before the failure
        completed: Vec<CompletionStep>,
        #[source]
        source: PersistenceError,
    },

    #[error("Invalid curriculum: {0}")]
    Curriculum(#[from] CurriculumError),

    #[error("Invalid quiz result: {correct}/{total}")]
    InvalidQuizResult { correct: u32, total: u32 },
}

impl StoreError {
    /// The underlying adapter error, if any
    pub fn persistence(&self) -> Option<&PersistenceError> {
        match self {
            StoreError::Persistence(e) => Some(e),
            StoreError::Completion { source, .. } => Some(source),
            _ => None,
        }
    }
}
