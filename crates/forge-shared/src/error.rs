//! Error types for the content registry.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurriculumError {
    #[error("Curriculum has no lessons")]
    Empty,

    #[error("Duplicate lesson id: {0}")]
    DuplicateLesson(String),

    #[error("Invalid level table: {0}")]
    LevelTable(String),

    #[error("Unknown lesson: {0}")]
    UnknownLesson(String),
}
