//! Learner progress records (v0.4.0).
//!
//! Per-lesson progress, the achievement singleton and the per-day task set.
//! These are the shapes the persistence adapters store and the progress
//! store caches.

use chrono::{DateTime, NaiveDate, Utc};
use crate::streaks::next_streak;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Lesson progress
// ============================================================================

/// Lesson lifecycle: locked -> available -> in-progress -> completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Whether the learner can open the lesson
    pub fn is_playable(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(Self::Locked),
            "available" => Ok(Self::Available),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown lesson status: {}", other)),
        }
    }
}

/// Stored progress for one lesson. Created on first write, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub status: LessonStatus,
    #[serde(default)]
    pub stars_earned: u32,
    #[serde(default)]
    pub time_spent_secs: u64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub marks: CompletionMarks,
}

impl LessonProgress {
    pub fn new(lesson_id: &str, status: LessonStatus) -> Self {
        Self {
            lesson_id: lesson_id.to_string(),
            status,
            stars_earned: 0,
            time_spent_secs: 0,
            started_at: None,
            completed_at: None,
            marks: CompletionMarks::default(),
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &ProgressPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(stars) = patch.stars_earned {
            self.stars_earned = stars;
        }
        if let Some(secs) = patch.time_spent_secs {
            self.time_spent_secs = secs;
        }
        if let Some(ts) = patch.started_at {
            self.started_at = Some(ts);
        }
        if let Some(ts) = patch.completed_at {
            self.completed_at = Some(ts);
        }
    }

    /// Locked -> available. Any other status is left alone.
    pub fn unlock(&mut self) -> bool {
        if self.status == LessonStatus::Locked {
            self.status = LessonStatus::Available;
            return true;
        }
        false
    }

    /// Record a completion
    pub fn complete(
        &mut self,
        stars_earned: u32,
        metadata: &CompletionMetadata,
        at: DateTime<Utc>,
    ) {
        self.status = LessonStatus::Completed;
        self.stars_earned = self.stars_earned.max(stars_earned);
        self.time_spent_secs += metadata.time_spent_secs;
        self.completed_at = Some(at);
    }
}

/// One-shot completion effects already applied to a lesson. Each mark is
/// written in the same adapter call as its effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarks {
    #[serde(default)]
    pub stars_credited: bool,
    #[serde(default)]
    pub streak_recorded: bool,
    #[serde(default)]
    pub daily_counted: bool,
}

impl CompletionMarks {
    pub fn all() -> Self {
        Self {
            stars_credited: true,
            streak_recorded: true,
            daily_counted: true,
        }
    }

    pub fn is_set(&self, effect: &CompletionEffect) -> bool {
        match effect {
            CompletionEffect::CreditStars(_) => self.stars_credited,
            CompletionEffect::RecordStreak(_) => self.streak_recorded,
            CompletionEffect::CountDailyTask(_) => self.daily_counted,
        }
    }

    pub fn set(&mut self, effect: &CompletionEffect) {
        match effect {
            CompletionEffect::CreditStars(_) => self.stars_credited = true,
            CompletionEffect::RecordStreak(_) => self.streak_recorded = true,
            CompletionEffect::CountDailyTask(_) => self.daily_counted = true,
        }
    }

    pub fn is_complete(&self) -> bool {
        *self == Self::all()
    }
}

/// A non-idempotent effect of completing a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionEffect {
    CreditStars(u32),
    RecordStreak(NaiveDate),
    /// Count toward the named task of that day. `None` only sets the mark
    /// (no open lesson task, or no task set loaded).
    CountDailyTask(Option<DailyTaskRef>),
}

/// Address of one daily task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTaskRef {
    pub date: NaiveDate,
    pub task_id: String,
}

/// Partial fields for `update_progress`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressPatch {
    pub status: Option<LessonStatus>,
    pub stars_earned: Option<u32>,
    pub time_spent_secs: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressPatch {
    pub fn status(status: LessonStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Answers right out of questions asked in one quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
}

impl QuizScore {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct >= self.total
    }
}

/// Extra data recorded alongside a lesson completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionMetadata {
    #[serde(default)]
    pub time_spent_secs: u64,
}

impl CompletionMetadata {
    pub fn timed(time_spent_secs: u64) -> Self {
        Self { time_spent_secs }
    }
}

// ============================================================================
// Achievement
// ============================================================================

/// The learner's aggregate record. One per learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub total_stars: u32,
    /// Highest level whose threshold is met (kept in sync by level-up checks)
    pub level: u32,
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_lessons: BTreeSet<String>,
    #[serde(default)]
    pub badges: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Achievement {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            total_stars: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            completed_lessons: BTreeSet::new(),
            badges: BTreeSet::new(),
            created_at,
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.contains(badge_id)
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    pub fn add_stars(&mut self, stars: u32) {
        self.total_stars = self.total_stars.saturating_add(stars);
    }

    /// Set insert. Returns false if the badge was already held.
    pub fn add_badge(&mut self, badge_id: &str) -> bool {
        self.badges.insert(badge_id.to_string())
    }

    pub fn mark_completed(&mut self, lesson_id: &str) -> bool {
        self.completed_lessons.insert(lesson_id.to_string())
    }

    /// Count one event toward `task`, paying its reward if this completes it.
    /// Returns true when the task completed.
    pub fn count_task(&mut self, task: &mut DailyTaskItem) -> bool {
        let completed = task.advance();
        if completed {
            self.add_stars(task.stars);
        }
        completed
    }

    /// Count learning activity on `today` toward the streak
    pub fn record_activity(&mut self, today: NaiveDate) {
        let update = next_streak(self.last_active_date, self.current_streak, today);
        self.current_streak = update.current_streak;
        self.longest_streak = self.longest_streak.max(update.current_streak);
        self.last_active_date = Some(today);
    }

    pub fn apply(&mut self, patch: &AchievementPatch) {
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(stars) = patch.total_stars {
            self.total_stars = stars;
        }
        if let Some(streak) = patch.current_streak {
            self.current_streak = streak;
            self.longest_streak = self.longest_streak.max(streak);
        }
    }
}

/// Partial fields for `update_achievement`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementPatch {
    pub level: Option<u32>,
    pub total_stars: Option<u32>,
    pub current_streak: Option<u32>,
}

impl AchievementPatch {
    pub fn level(level: u32) -> Self {
        Self {
            level: Some(level),
            ..Default::default()
        }
    }
}

// ============================================================================
// Daily tasks
// ============================================================================

/// Kind of learning event a daily task counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Lesson,
    Exercise,
    Review,
    Quiz,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Exercise => "exercise",
            Self::Review => "review",
            Self::Quiz => "quiz",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lesson" => Ok(Self::Lesson),
            "exercise" => Ok(Self::Exercise),
            "review" => Ok(Self::Review),
            "quiz" => Ok(Self::Quiz),
            other => Err(format!(
                "unknown task type '{}'. Valid values: lesson, exercise, review, quiz",
                other
            )),
        }
    }
}

/// One reward-bearing goal for the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTaskItem {
    pub id: String,
    pub task_type: TaskType,
    pub title: crate::curriculum::LocalizedText,
    pub target: u32,
    pub progress: u32,
    pub stars: u32,
    pub completed: bool,
}

impl DailyTaskItem {
    /// Step progress by one. Returns true only on the step that reaches the
    /// target; a completed task never moves again.
    pub fn advance(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.set_progress(self.progress + 1)
    }

    /// Set progress (capped at target). Returns true if this call completed the task.
    pub fn set_progress(&mut self, progress: u32) -> bool {
        if self.completed {
            return false;
        }
        self.progress = progress.min(self.target);
        if self.progress >= self.target {
            self.completed = true;
            return true;
        }
        false
    }
}

/// All tasks for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTaskSet {
    pub id: String,
    pub date: NaiveDate,
    pub tasks: Vec<DailyTaskItem>,
}

impl DailyTaskSet {
    /// Fresh set for `date`, zeroed from the templates
    pub fn seed(date: NaiveDate, templates: &[crate::curriculum::DailyTaskTemplate]) -> Self {
        let tasks = templates
            .iter()
            .map(|t| DailyTaskItem {
                id: t.id.clone(),
                task_type: t.task_type,
                title: t.title.clone(),
                target: t.target,
                progress: 0,
                stars: t.stars,
                completed: false,
            })
            .collect();

        Self {
            id: daily_set_id(date),
            date,
            tasks,
        }
    }

    /// First task of this type that still counts
    pub fn next_open(&self, task_type: TaskType) -> Option<&DailyTaskItem> {
        self.tasks
            .iter()
            .find(|t| t.task_type == task_type && !t.completed)
    }

    pub fn task(&self, task_id: &str) -> Option<&DailyTaskItem> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut DailyTaskItem> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

/// ISO date key, `YYYY-MM-DD`
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn daily_set_id(date: NaiveDate) -> String {
    format!("daily-{}", date_key(date))
}
