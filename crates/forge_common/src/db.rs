//! Progress persistence trait abstraction (v0.4.0)
//!
//! The progress store treats the adapter as the source of truth: every
//! mutation is written here first and the store re-reads afterwards.
//!
//! ## Implementations
//!
//! - `MemoryProgressDb`: in-process maps, used for tests and `--memory` runs
//! - `SqliteProgressDb`: on-device SQLite file
//!
//! Adapter contract:
//! - `update_progress` upserts (the record is created on first write)
//! - `unlock_lesson` only moves an absent or locked record to available
//! - `init_achievement` creates the singleton only if it is absent
//! - `add_badge` and `mark_lesson_completed` are set inserts
//! - `update_daily_task` clamps progress to the task target and derives `completed`
//! - `apply_completion_effect` applies the effect and sets its mark on the
//!   lesson record in one write, and does nothing if the mark is already set

use crate::error::PersistenceError;
use async_trait::async_trait;
use chrono::NaiveDate;
use forge_shared::{
    Achievement, AchievementPatch, CompletionEffect, CompletionMetadata, DailyTaskSet,
    LessonProgress, ProgressPatch,
};

pub type DbResult<T> = Result<T, PersistenceError>;

/// Storage for one learner's progress
#[async_trait]
pub trait ProgressDb: Send + Sync {
    // --- lesson progress ---

    async fn get_all_progress(&self) -> DbResult<Vec<LessonProgress>>;

    async fn update_progress(&self, lesson_id: &str, patch: &ProgressPatch) -> DbResult<()>;

    /// Write the completion record: status, stars, time spent, timestamp
    async fn complete_lesson(
        &self,
        lesson_id: &str,
        stars_earned: u32,
        metadata: &CompletionMetadata,
    ) -> DbResult<()>;

    /// Add the lesson to the achievement's completed set
    async fn mark_lesson_completed(&self, lesson_id: &str) -> DbResult<()>;

    async fn unlock_lesson(&self, lesson_id: &str) -> DbResult<()>;

    /// Apply a one-shot completion effect to a recorded lesson. Returns
    /// false when the lesson's mark shows it already ran.
    async fn apply_completion_effect(
        &self,
        lesson_id: &str,
        effect: &CompletionEffect,
    ) -> DbResult<bool>;

    // --- achievement ---

    async fn get_achievement(&self) -> DbResult<Option<Achievement>>;

    async fn init_achievement(&self) -> DbResult<()>;

    async fn update_achievement(&self, patch: &AchievementPatch) -> DbResult<()>;

    async fn add_stars(&self, stars: u32) -> DbResult<()>;

    async fn add_badge(&self, badge_id: &str) -> DbResult<()>;

    /// Record learning activity on `today` and advance the streak
    async fn update_streak(&self, today: NaiveDate) -> DbResult<()>;

    // --- daily tasks ---

    async fn get_daily_tasks(&self, date: NaiveDate) -> DbResult<Option<DailyTaskSet>>;

    async fn create_daily_tasks(&self, set: &DailyTaskSet) -> DbResult<()>;

    async fn update_daily_task(
        &self,
        date: NaiveDate,
        task_id: &str,
        progress: u32,
    ) -> DbResult<()>;
}
