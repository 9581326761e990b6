//! Shared types and rules for StudyForge components.
//! v0.4.0: Kids course progress tracker (records, catalog, levels, badges, streaks).

pub mod achievements;
pub mod curriculum;
pub mod error;
pub mod levels;
pub mod progress;
pub mod streaks;

pub use curriculum::{
    Curriculum, DailyTaskTemplate, Lesson, LessonKind, LevelConfig, LocalizedText, Unit,
};
pub use error::CurriculumError;
pub use levels::{LevelProgress, LevelUp};
pub use progress::{
    Achievement, AchievementPatch, CompletionEffect, CompletionMarks, CompletionMetadata,
    DailyTaskItem, DailyTaskRef, DailyTaskSet, LessonProgress, LessonStatus, ProgressPatch,
    QuizScore, TaskType,
};
