//! Shared fixtures for progress store integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use forge_common::{
    Clock, DbResult, FixedClock, MemoryProgressDb, PersistenceError, ProgressDb, ProgressStore,
};
use forge_shared::{
    Achievement, AchievementPatch, CompletionEffect, CompletionMetadata, Curriculum, DailyTaskSet,
    LessonProgress, ProgressPatch,
};
use std::sync::{Arc, Mutex};

pub fn day_one() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
}

pub struct Fixture {
    pub db: Arc<FaultyDb>,
    pub clock: Arc<FixedClock>,
    pub store: ProgressStore,
}

/// Kids course over an in-memory adapter, clock on `day_one()`
pub fn fixture() -> Fixture {
    let db = Arc::new(FaultyDb::new(MemoryProgressDb::new()));
    let clock = Arc::new(FixedClock::on(day_one()));
    let store = ProgressStore::new(
        db.clone(),
        Arc::new(Curriculum::kids_course()),
        clock.clone() as Arc<dyn Clock>,
    )
    .unwrap();
    Fixture { db, clock, store }
}

pub async fn initialized() -> Fixture {
    let mut fx = fixture();
    fx.store.initialize().await.unwrap();
    fx
}

/// Adapter wrapper that fails one named operation on demand
pub struct FaultyDb {
    inner: MemoryProgressDb,
    fail_on: Mutex<Option<&'static str>>,
}

impl FaultyDb {
    pub fn new(inner: MemoryProgressDb) -> Self {
        Self {
            inner,
            fail_on: Mutex::new(None),
        }
    }

    pub fn fail_on(&self, op: &'static str) {
        *self.fail_on.lock().unwrap() = Some(op);
    }

    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    fn check(&self, op: &str) -> DbResult<()> {
        match *self.fail_on.lock().unwrap() {
            Some(failing) if failing == op => {
                Err(PersistenceError::Unavailable(format!("{} injected failure", op)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProgressDb for FaultyDb {
    async fn get_all_progress(&self) -> DbResult<Vec<LessonProgress>> {
        self.check("get_all_progress")?;
        self.inner.get_all_progress().await
    }

    async fn update_progress(&self, lesson_id: &str, patch: &ProgressPatch) -> DbResult<()> {
        self.check("update_progress")?;
        self.inner.update_progress(lesson_id, patch).await
    }

    async fn complete_lesson(
        &self,
        lesson_id: &str,
        stars_earned: u32,
        metadata: &CompletionMetadata,
    ) -> DbResult<()> {
        self.check("complete_lesson")?;
        self.inner.complete_lesson(lesson_id, stars_earned, metadata).await
    }

    async fn mark_lesson_completed(&self, lesson_id: &str) -> DbResult<()> {
        self.check("mark_lesson_completed")?;
        self.inner.mark_lesson_completed(lesson_id).await
    }

    async fn unlock_lesson(&self, lesson_id: &str) -> DbResult<()> {
        self.check("unlock_lesson")?;
        self.inner.unlock_lesson(lesson_id).await
    }

    /// Fails under the name of the plain operation the effect stands in for
    async fn apply_completion_effect(
        &self,
        lesson_id: &str,
        effect: &CompletionEffect,
    ) -> DbResult<bool> {
        self.check(match effect {
            CompletionEffect::CreditStars(_) => "add_stars",
            CompletionEffect::RecordStreak(_) => "update_streak",
            CompletionEffect::CountDailyTask(_) => "update_daily_task",
        })?;
        self.inner.apply_completion_effect(lesson_id, effect).await
    }

    async fn get_achievement(&self) -> DbResult<Option<Achievement>> {
        self.check("get_achievement")?;
        self.inner.get_achievement().await
    }

    async fn init_achievement(&self) -> DbResult<()> {
        self.check("init_achievement")?;
        self.inner.init_achievement().await
    }

    async fn update_achievement(&self, patch: &AchievementPatch) -> DbResult<()> {
        self.check("update_achievement")?;
        self.inner.update_achievement(patch).await
    }

    async fn add_stars(&self, stars: u32) -> DbResult<()> {
        self.check("add_stars")?;
        self.inner.add_stars(stars).await
    }

    async fn add_badge(&self, badge_id: &str) -> DbResult<()> {
        self.check("add_badge")?;
        self.inner.add_badge(badge_id).await
    }

    async fn update_streak(&self, today: NaiveDate) -> DbResult<()> {
        self.check("update_streak")?;
        self.inner.update_streak(today).await
    }

    async fn get_daily_tasks(&self, date: NaiveDate) -> DbResult<Option<DailyTaskSet>> {
        self.check("get_daily_tasks")?;
        self.inner.get_daily_tasks(date).await
    }

    async fn create_daily_tasks(&self, set: &DailyTaskSet) -> DbResult<()> {
        self.check("create_daily_tasks")?;
        self.inner.create_daily_tasks(set).await
    }

    async fn update_daily_task(
        &self,
        date: NaiveDate,
        task_id: &str,
        progress: u32,
    ) -> DbResult<()> {
        self.check("update_daily_task")?;
        self.inner.update_daily_task(date, task_id, progress).await
    }
}
