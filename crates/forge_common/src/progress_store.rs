//! Learner Progress Store v0.4.0
//!
//! In-memory projection of one learner's progress over a `ProgressDb`.
//!
//! Every mutation writes through to the adapter and then re-reads the
//! affected record, so the cache never drifts from what is stored. Actions
//! return `Result`; failures are logged and leave the cache where the last
//! successful step put it (no rollback).
//!
//! ## Lesson completion
//!
//! `complete_lesson` runs ten steps in order and records each one:
//! record, mark completed, credit stars, streak, unlock next, daily task,
//! badges, level-up, reload, clear current lesson. A failure stops the
//! sequence and `StoreError::Completion` names the failed step plus the
//! steps already applied.
//!
//! The one-shot steps leave durable traces: the completed record, the entry
//! in `completed_lessons`, and the lesson's `CompletionMarks` for stars,
//! streak and daily task (each mark is written with its effect). A call
//! runs only the one-shot steps whose trace is missing, then the idempotent
//! ones. Retrying an interrupted completion therefore finishes exactly what
//! did not run. When every trace is already there the call is a replay.
//!
//! ## Concurrency
//!
//! Actions take `&mut self`. Callers that share a store across tasks wrap it
//! in `SharedProgressStore`, which serializes every action behind one async
//! mutex.

use crate::clock::Clock;
use crate::db::{DbResult, ProgressDb};
use crate::error::{CompletionStep, PersistenceError, StoreError};
use forge_shared::achievements::{self, PERFECT_SCORE};
use forge_shared::levels::{self, LevelProgress, LevelUp};
use forge_shared::{
    Achievement, AchievementPatch, CompletionEffect, CompletionMetadata, Curriculum,
    CurriculumError, DailyTaskItem, DailyTaskRef, DailyTaskSet, LessonKind, LessonProgress,
    LessonStatus, LevelConfig, ProgressPatch, QuizScore, TaskType,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A store shared between tasks; the mutex is the per-learner action queue
pub type SharedProgressStore = Arc<tokio::sync::Mutex<ProgressStore>>;

/// What a lesson completion did
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub lesson_id: String,
    /// Every one-shot step had already run; nothing was credited
    pub replay: bool,
    pub stars_credited: u32,
    /// Next lesson in curriculum order, now unlocked
    pub next_lesson: Option<String>,
    /// The "lesson" daily task after this completion counted toward it
    pub daily_task: Option<DailyTaskItem>,
    pub badges_unlocked: Vec<String>,
    pub level_up: LevelUp,
    /// Steps applied, in order
    pub steps: Vec<CompletionStep>,
}

impl CompletionReport {
    fn new(lesson_id: &str, replay: bool) -> Self {
        Self {
            lesson_id: lesson_id.to_string(),
            replay,
            stars_credited: 0,
            next_lesson: None,
            daily_task: None,
            badges_unlocked: Vec::new(),
            level_up: LevelUp::unchanged(1),
            steps: Vec::new(),
        }
    }

    fn failed(&self, step: CompletionStep, source: PersistenceError) -> StoreError {
        StoreError::Completion {
            lesson_id: self.lesson_id.clone(),
            step,
            completed: self.steps.clone(),
            source,
        }
    }
}

/// Result of a non-lesson learning event (exercise, review)
#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    pub task: Option<DailyTaskItem>,
    pub level_up: LevelUp,
}

/// Result of a finished quiz
#[derive(Debug, Clone, Serialize)]
pub struct QuizReport {
    pub score: QuizScore,
    pub task: Option<DailyTaskItem>,
    pub perfect_badge: bool,
    pub level_up: LevelUp,
}

fn log_failure(action: &str, e: PersistenceError) -> StoreError {
    warn!(action, error = %e, retryable = e.is_retryable(), "Progress store action failed");
    StoreError::Persistence(e)
}

pub struct ProgressStore {
    db: Arc<dyn ProgressDb>,
    curriculum: Arc<Curriculum>,
    clock: Arc<dyn Clock>,

    progress: HashMap<String, LessonProgress>,
    achievement: Option<Achievement>,
    daily_tasks: Option<DailyTaskSet>,
    current_lesson: Option<String>,
    is_loading: bool,
}

impl ProgressStore {
    /// Build a store over `db`. The curriculum is validated up front.
    pub fn new(
        db: Arc<dyn ProgressDb>,
        curriculum: Arc<Curriculum>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        curriculum.validate()?;
        Ok(Self {
            db,
            curriculum,
            clock,
            progress: HashMap::new(),
            achievement: None,
            daily_tasks: None,
            current_lesson: None,
            is_loading: false,
        })
    }

    pub fn into_shared(self) -> SharedProgressStore {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    // ========================================================================
    // Initialization and loading
    // ========================================================================

    /// Ensure the achievement exists, load everything, and make sure the
    /// first lesson of the curriculum is playable.
    pub async fn initialize(&mut self) -> Result<(), StoreError> {
        self.is_loading = true;
        let result = self.try_initialize().await;
        self.is_loading = false;

        match result {
            Ok(()) => {
                info!(
                    lessons = self.progress.len(),
                    stars = self.total_stars(),
                    "Progress store initialized"
                );
                Ok(())
            }
            Err(e) => Err(log_failure("initialize", e)),
        }
    }

    async fn try_initialize(&mut self) -> DbResult<()> {
        self.db.init_achievement().await?;
        self.refresh_progress().await?;
        self.refresh_achievement().await?;
        self.refresh_daily_tasks().await?;

        let curriculum = Arc::clone(&self.curriculum);
        if let Some(first) = curriculum.first_lesson() {
            let locked = self
                .progress
                .get(&first.id)
                .map_or(true, |p| p.status == LessonStatus::Locked);
            if locked {
                debug!(lesson = %first.id, "Unlocking first lesson");
                self.db.unlock_lesson(&first.id).await?;
                self.refresh_progress().await?;
            }
        }
        Ok(())
    }

    pub async fn load_progress(&mut self) -> Result<(), StoreError> {
        self.refresh_progress()
            .await
            .map_err(|e| log_failure("load progress", e))
    }

    pub async fn load_achievement(&mut self) -> Result<(), StoreError> {
        self.refresh_achievement()
            .await
            .map_err(|e| log_failure("load achievement", e))
    }

    /// Load today's task set, seeding it from the templates if none exists
    pub async fn load_daily_tasks(&mut self) -> Result<(), StoreError> {
        self.refresh_daily_tasks()
            .await
            .map_err(|e| log_failure("load daily tasks", e))
    }

    async fn refresh_progress(&mut self) -> DbResult<()> {
        let list = self.db.get_all_progress().await?;
        self.progress = list.into_iter().map(|p| (p.lesson_id.clone(), p)).collect();
        Ok(())
    }

    async fn refresh_achievement(&mut self) -> DbResult<()> {
        self.achievement = self.db.get_achievement().await?;
        Ok(())
    }

    async fn refresh_daily_tasks(&mut self) -> DbResult<()> {
        let today = self.clock.today();
        let set = match self.db.get_daily_tasks(today).await? {
            Some(set) => set,
            None => {
                let seeded = DailyTaskSet::seed(today, &self.curriculum.daily_templates);
                self.db.create_daily_tasks(&seeded).await?;
                debug!(date = %today, tasks = seeded.tasks.len(), "Created daily tasks");
                self.db.get_daily_tasks(today).await?.unwrap_or(seeded)
            }
        };
        self.daily_tasks = Some(set);
        Ok(())
    }

    // ========================================================================
    // Lesson lifecycle
    // ========================================================================

    /// Point the store at `lesson_id` and mark it in progress.
    ///
    /// Not guarded: a locked lesson can be started. A completed lesson keeps
    /// its completed status so the lifecycle never runs backwards.
    pub async fn start_lesson(&mut self, lesson_id: &str) -> Result<(), StoreError> {
        self.current_lesson = Some(lesson_id.to_string());

        let mut patch = ProgressPatch {
            started_at: Some(self.clock.now()),
            ..Default::default()
        };
        if self.lesson_status(lesson_id) != LessonStatus::Completed {
            patch.status = Some(LessonStatus::InProgress);
        }

        let result: DbResult<()> = async {
            self.db.update_progress(lesson_id, &patch).await?;
            self.refresh_progress().await
        }
        .await;
        result.map_err(|e| log_failure("start lesson", e))
    }

    /// Complete a lesson and derive everything that follows from it
    pub async fn complete_lesson(
        &mut self,
        lesson_id: &str,
        stars_earned: u32,
        metadata: &CompletionMetadata,
    ) -> Result<CompletionReport, StoreError> {
        let result = self.run_completion(lesson_id, stars_earned, metadata).await;
        match &result {
            Ok(report) => info!(
                lesson = lesson_id,
                stars = report.stars_credited,
                badges = ?report.badges_unlocked,
                replay = report.replay,
                "Lesson completed"
            ),
            Err(e) => warn!(lesson = lesson_id, error = %e, "Lesson completion failed"),
        }
        result
    }

    async fn run_completion(
        &mut self,
        lesson_id: &str,
        stars_earned: u32,
        metadata: &CompletionMetadata,
    ) -> Result<CompletionReport, StoreError> {
        use CompletionStep as Step;

        // Fresh reads: the cache may predate a completion made elsewhere
        let snapshot: DbResult<(Option<LessonProgress>, bool)> = async {
            let record = self
                .db
                .get_all_progress()
                .await?
                .into_iter()
                .find(|p| p.lesson_id == lesson_id);
            let listed = self
                .db
                .get_achievement()
                .await?
                .map_or(false, |a| a.has_completed(lesson_id));
            Ok((record, listed))
        }
        .await;
        let (record, listed) = snapshot.map_err(|source| {
            CompletionReport::new(lesson_id, false).failed(Step::RecordCompletion, source)
        })?;

        let recorded = record.filter(|p| p.status == LessonStatus::Completed);
        let marks = recorded.as_ref().map(|p| p.marks).unwrap_or_default();
        let replay = listed && marks.is_complete();
        let mut report = CompletionReport::new(lesson_id, replay);

        // An earlier attempt's record decides the stars
        let stars = match &recorded {
            Some(p) => p.stars_earned,
            None => {
                self.db
                    .complete_lesson(lesson_id, stars_earned, metadata)
                    .await
                    .map_err(|e| report.failed(Step::RecordCompletion, e))?;
                report.steps.push(Step::RecordCompletion);
                stars_earned
            }
        };

        if !listed {
            self.db
                .mark_lesson_completed(lesson_id)
                .await
                .map_err(|e| report.failed(Step::MarkCompleted, e))?;
            report.steps.push(Step::MarkCompleted);
        }

        if !marks.stars_credited {
            let credited = self
                .apply_effect(lesson_id, CompletionEffect::CreditStars(stars))
                .await
                .map_err(|e| report.failed(Step::CreditStars, e))?;
            if credited {
                report.stars_credited = stars;
            }
            report.steps.push(Step::CreditStars);
        }

        if !marks.streak_recorded {
            let today = self.clock.today();
            self.apply_effect(lesson_id, CompletionEffect::RecordStreak(today))
                .await
                .map_err(|e| report.failed(Step::UpdateStreak, e))?;
            report.steps.push(Step::UpdateStreak);
        }

        let curriculum = Arc::clone(&self.curriculum);
        if let Some(next) = curriculum.next_lesson(lesson_id) {
            self.db
                .unlock_lesson(&next.id)
                .await
                .map_err(|e| report.failed(Step::UnlockNext, e))?;
            report.next_lesson = Some(next.id.clone());
        }
        report.steps.push(Step::UnlockNext);

        if !marks.daily_counted {
            report.daily_task = self
                .count_lesson_task(lesson_id)
                .await
                .map_err(|e| report.failed(Step::DailyTask, e))?;
            report.steps.push(Step::DailyTask);
        }

        report.badges_unlocked = self
            .unlock_badges(lesson_id)
            .await
            .map_err(|e| report.failed(Step::Badges, e))?;
        report.steps.push(Step::Badges);

        report.level_up = self
            .apply_level_up()
            .await
            .map_err(|e| report.failed(Step::LevelUp, e))?;
        report.steps.push(Step::LevelUp);

        let reload: DbResult<()> = async {
            self.refresh_progress().await?;
            self.refresh_achievement().await
        }
        .await;
        reload.map_err(|e| report.failed(Step::Reload, e))?;
        report.steps.push(Step::Reload);

        self.current_lesson = None;
        report.steps.push(Step::ClearCurrent);

        Ok(report)
    }

    /// Cached status. Without a record: the head of the curriculum and any
    /// lesson whose predecessor is completed read `available`, other
    /// curriculum lessons read `locked`, unknown ids read `available`.
    pub fn lesson_status(&self, lesson_id: &str) -> LessonStatus {
        if let Some(p) = self.progress.get(lesson_id) {
            return p.status;
        }
        if self.curriculum.lesson(lesson_id).is_none() {
            return LessonStatus::Available;
        }

        match self.curriculum.previous_lesson(lesson_id) {
            None => LessonStatus::Available,
            Some(prev) => match self.progress.get(&prev.id) {
                Some(p) if p.status == LessonStatus::Completed => LessonStatus::Available,
                _ => LessonStatus::Locked,
            },
        }
    }

    // ========================================================================
    // Achievement
    // ========================================================================

    pub async fn add_stars(&mut self, stars: u32) -> Result<(), StoreError> {
        self.credit_stars(stars)
            .await
            .map_err(|e| log_failure("add stars", e))
    }

    pub async fn add_badge(&mut self, badge_id: &str) -> Result<(), StoreError> {
        self.grant_badge(badge_id)
            .await
            .map_err(|e| log_failure("add badge", e))
    }

    pub async fn update_streak(&mut self) -> Result<(), StoreError> {
        self.record_streak()
            .await
            .map_err(|e| log_failure("update streak", e))
    }

    /// Raise the stored level to the highest one the star total reaches
    pub async fn check_level_up(&mut self) -> Result<LevelUp, StoreError> {
        self.apply_level_up()
            .await
            .map_err(|e| log_failure("check level up", e))
    }

    /// Award every badge the current snapshot has earned; returns the new ones
    pub async fn check_badge_unlock(&mut self, lesson_id: &str) -> Result<Vec<String>, StoreError> {
        self.unlock_badges(lesson_id)
            .await
            .map_err(|e| log_failure("check badge unlock", e))
    }

    async fn credit_stars(&mut self, stars: u32) -> DbResult<()> {
        self.db.add_stars(stars).await?;
        self.refresh_achievement().await
    }

    async fn grant_badge(&mut self, badge_id: &str) -> DbResult<()> {
        self.db.add_badge(badge_id).await?;
        self.refresh_achievement().await
    }

    async fn record_streak(&mut self) -> DbResult<()> {
        self.db.update_streak(self.clock.today()).await?;
        self.refresh_achievement().await
    }

    /// One marked completion effect, then reload. Returns whether it ran.
    async fn apply_effect(&mut self, lesson_id: &str, effect: CompletionEffect) -> DbResult<bool> {
        let applied = self.db.apply_completion_effect(lesson_id, &effect).await?;
        self.refresh_achievement().await?;
        Ok(applied)
    }

    async fn apply_level_up(&mut self) -> DbResult<LevelUp> {
        let Some(achievement) = &self.achievement else {
            return Ok(LevelUp::unchanged(1));
        };

        let current = achievement.level;
        let reached = levels::level_for_stars(achievement.total_stars, &self.curriculum.levels);
        if reached <= current {
            return Ok(LevelUp::unchanged(current));
        }

        self.db.update_achievement(&AchievementPatch::level(reached)).await?;
        self.refresh_achievement().await?;
        info!(from = current, to = reached, "Level up");
        Ok(LevelUp {
            leveled_up: true,
            new_level: reached,
        })
    }

    async fn unlock_badges(&mut self, lesson_id: &str) -> DbResult<Vec<String>> {
        let Some(snapshot) = self.achievement.clone() else {
            return Ok(Vec::new());
        };

        let earned = achievements::evaluate_badge_unlocks(lesson_id, &snapshot, &self.curriculum);
        for badge_id in &earned {
            self.grant_badge(badge_id).await?;
            debug!(badge = %badge_id, "Badge unlocked");
        }
        Ok(earned)
    }

    // ========================================================================
    // Daily tasks
    // ========================================================================

    /// Count one event toward the first open task of `task_type`.
    ///
    /// Returns the task after the update, or `None` when nothing counted
    /// (no open task of that type, or tasks not loaded).
    pub async fn update_daily_task_progress(
        &mut self,
        task_type: TaskType,
    ) -> Result<Option<DailyTaskItem>, StoreError> {
        self.advance_daily_task(task_type)
            .await
            .map_err(|e| log_failure("update daily task", e))
    }

    /// Switch a loaded task set over to today's once the date has moved on
    async fn roll_over_daily_tasks(&mut self) -> DbResult<()> {
        match &self.daily_tasks {
            Some(cached) if cached.date != self.clock.today() => self.refresh_daily_tasks().await,
            _ => Ok(()),
        }
    }

    /// The completion's share of the "lesson" daily task. Marks the lesson
    /// counted even when no task is open, so a later retry cannot count it.
    async fn count_lesson_task(&mut self, lesson_id: &str) -> DbResult<Option<DailyTaskItem>> {
        self.roll_over_daily_tasks().await?;
        let target = self.daily_tasks.as_ref().and_then(|set| {
            set.next_open(TaskType::Lesson).map(|t| DailyTaskRef {
                date: set.date,
                task_id: t.id.clone(),
            })
        });

        let effect = CompletionEffect::CountDailyTask(target.clone());
        if !self.apply_effect(lesson_id, effect).await? {
            return Ok(None);
        }
        let Some(target) = target else {
            return Ok(None);
        };
        self.refresh_daily_tasks().await?;
        debug!(task = %target.task_id, "Lesson counted toward daily task");

        Ok(self
            .daily_tasks
            .as_ref()
            .and_then(|s| s.task(&target.task_id))
            .cloned())
    }

    async fn advance_daily_task(&mut self, task_type: TaskType) -> DbResult<Option<DailyTaskItem>> {
        if self.daily_tasks.is_none() {
            return Ok(None);
        }
        self.roll_over_daily_tasks().await?;

        let Some(set) = &self.daily_tasks else {
            return Ok(None);
        };
        let Some(task) = set.next_open(task_type).cloned() else {
            return Ok(None);
        };
        let date = set.date;

        let progress = task.progress + 1;
        self.db.update_daily_task(date, &task.id, progress).await?;
        if progress >= task.target {
            self.credit_stars(task.stars).await?;
            debug!(task = %task.id, stars = task.stars, "Daily task completed");
        }
        self.refresh_daily_tasks().await?;

        Ok(self
            .daily_tasks
            .as_ref()
            .and_then(|s| s.task(&task.id))
            .cloned())
    }

    /// Exercise or review event: daily task credit plus a level check
    pub async fn record_activity(
        &mut self,
        task_type: TaskType,
    ) -> Result<ActivityReport, StoreError> {
        let result: DbResult<ActivityReport> = async {
            let task = self.advance_daily_task(task_type).await?;
            let level_up = self.apply_level_up().await?;
            Ok(ActivityReport { task, level_up })
        }
        .await;
        result.map_err(|e| log_failure("record activity", e))
    }

    /// A finished quiz. Counts toward the quiz daily task; a perfect score on
    /// a unit quiz earns the perfect-score badge.
    pub async fn record_quiz_result(
        &mut self,
        lesson_id: &str,
        correct: u32,
        total: u32,
    ) -> Result<QuizReport, StoreError> {
        if total == 0 || correct > total {
            return Err(StoreError::InvalidQuizResult { correct, total });
        }
        let lesson = self
            .curriculum
            .lesson(lesson_id)
            .ok_or_else(|| CurriculumError::UnknownLesson(lesson_id.to_string()))?;
        let is_unit_quiz = lesson.kind == LessonKind::Quiz;
        let score = QuizScore { correct, total };

        let result: DbResult<QuizReport> = async {
            let task = self.advance_daily_task(TaskType::Quiz).await?;

            let already = self
                .achievement
                .as_ref()
                .map_or(false, |a| a.has_badge(PERFECT_SCORE));
            let perfect_badge =
                is_unit_quiz && score.is_perfect() && !already && self.achievement.is_some();
            if perfect_badge {
                self.grant_badge(PERFECT_SCORE).await?;
            }

            let level_up = self.apply_level_up().await?;
            Ok(QuizReport {
                score,
                task,
                perfect_badge,
                level_up,
            })
        }
        .await;
        result.map_err(|e| log_failure("record quiz result", e))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn total_stars(&self) -> u32 {
        self.achievement.as_ref().map_or(0, |a| a.total_stars)
    }

    pub fn completed_lessons_count(&self) -> usize {
        self.achievement.as_ref().map_or(0, |a| a.completed_lessons.len())
    }

    pub fn current_streak(&self) -> u32 {
        self.achievement.as_ref().map_or(0, |a| a.current_streak)
    }

    pub fn level(&self) -> u32 {
        self.achievement.as_ref().map_or(1, |a| a.level)
    }

    pub fn level_progress(&self) -> LevelProgress {
        levels::level_progress(self.total_stars(), self.level(), &self.curriculum.levels)
    }

    /// Title and reward of the current level
    pub fn level_info(&self) -> Option<&LevelConfig> {
        self.curriculum.level_config(self.level())
    }

    pub fn total_lessons(&self) -> usize {
        self.curriculum.total_lessons()
    }

    pub fn achievement(&self) -> Option<&Achievement> {
        self.achievement.as_ref()
    }

    pub fn daily_tasks(&self) -> Option<&DailyTaskSet> {
        self.daily_tasks.as_ref()
    }

    pub fn lesson_progress(&self, lesson_id: &str) -> Option<&LessonProgress> {
        self.progress.get(lesson_id)
    }

    pub fn current_lesson(&self) -> Option<&str> {
        self.current_lesson.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory_db::MemoryProgressDb;
    use chrono::NaiveDate;

    fn store() -> ProgressStore {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        ProgressStore::new(
            Arc::new(MemoryProgressDb::new()),
            Arc::new(Curriculum::kids_course()),
            Arc::new(clock),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_curriculum() {
        let mut bad = Curriculum::kids_course();
        bad.units.clear();
        let result = ProgressStore::new(
            Arc::new(MemoryProgressDb::new()),
            Arc::new(bad),
            Arc::new(crate::clock::SystemClock),
        );
        assert!(matches!(result, Err(StoreError::Curriculum(CurriculumError::Empty))));
    }

    #[test]
    fn test_defaults_before_initialize() {
        let s = store();
        assert_eq!(s.total_stars(), 0);
        assert_eq!(s.level(), 1);
        assert_eq!(s.current_streak(), 0);
        assert_eq!(s.completed_lessons_count(), 0);
        assert_eq!(s.level_progress().next, 50);
        assert!(!s.is_loading());
    }

    #[test]
    fn test_status_without_records() {
        let s = store();
        assert_eq!(s.lesson_status("lesson-1"), LessonStatus::Available);
        assert_eq!(s.lesson_status("lesson-2"), LessonStatus::Locked);
        assert_eq!(s.lesson_status("bonus-lesson"), LessonStatus::Available);
    }

    #[tokio::test]
    async fn test_level_up_without_achievement() {
        let mut s = store();
        let up = s.check_level_up().await.unwrap();
        assert_eq!(up, LevelUp::unchanged(1));
        assert!(s.check_badge_unlock("lesson-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_daily_progress_before_load_is_noop() {
        let mut s = store();
        assert!(s.update_daily_task_progress(TaskType::Lesson).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_lesson_sets_pointer() {
        let mut s = store();
        s.initialize().await.unwrap();
        s.start_lesson("lesson-1").await.unwrap();
        assert_eq!(s.current_lesson(), Some("lesson-1"));
        assert_eq!(s.lesson_status("lesson-1"), LessonStatus::InProgress);
        assert!(s.lesson_progress("lesson-1").unwrap().started_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_quiz_result() {
        let mut s = store();
        s.initialize().await.unwrap();
        assert!(matches!(
            s.record_quiz_result("lesson-6", 6, 5).await,
            Err(StoreError::InvalidQuizResult { .. })
        ));
        assert!(matches!(
            s.record_quiz_result("lesson-99", 1, 1).await,
            Err(StoreError::Curriculum(CurriculumError::UnknownLesson(_)))
        ));
    }
}
