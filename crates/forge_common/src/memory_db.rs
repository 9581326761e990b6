//! In-process progress adapter.
//!
//! Keeps every record in mutex-guarded maps. Used by tests and by
//! `forgectl --memory`; nothing survives the process.

use crate::db::{DbResult, ProgressDb};
use crate::error::PersistenceError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use forge_shared::{
    Achievement, AchievementPatch, CompletionEffect, CompletionMetadata, DailyTaskSet,
    LessonProgress, LessonStatus, ProgressPatch,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    progress: BTreeMap<String, LessonProgress>,
    achievement: Option<Achievement>,
    daily: HashMap<NaiveDate, DailyTaskSet>,
}

#[derive(Debug, Default)]
pub struct MemoryProgressDb {
    state: Mutex<MemoryState>,
}

impl MemoryProgressDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PersistenceError::Internal("memory store lock poisoned".to_string()))
    }

    fn with_achievement<F>(&self, f: F) -> DbResult<()>
    where
        F: FnOnce(&mut Achievement),
    {
        let mut state = self.lock()?;
        let achievement = state
            .achievement
            .as_mut()
            .ok_or_else(|| PersistenceError::Corrupt("achievement record missing".to_string()))?;
        f(achievement);
        Ok(())
    }
}

#[async_trait]
impl ProgressDb for MemoryProgressDb {
    async fn get_all_progress(&self) -> DbResult<Vec<LessonProgress>> {
        Ok(self.lock()?.progress.values().cloned().collect())
    }

    async fn update_progress(&self, lesson_id: &str, patch: &ProgressPatch) -> DbResult<()> {
        let mut state = self.lock()?;
        state
            .progress
            .entry(lesson_id.to_string())
            .or_insert_with(|| LessonProgress::new(lesson_id, LessonStatus::Locked))
            .apply(patch);
        Ok(())
    }

    async fn complete_lesson(
        &self,
        lesson_id: &str,
        stars_earned: u32,
        metadata: &CompletionMetadata,
    ) -> DbResult<()> {
        let mut state = self.lock()?;
        state
            .progress
            .entry(lesson_id.to_string())
            .or_insert_with(|| LessonProgress::new(lesson_id, LessonStatus::InProgress))
            .complete(stars_earned, metadata, Utc::now());
        Ok(())
    }

    async fn mark_lesson_completed(&self, lesson_id: &str) -> DbResult<()> {
        self.with_achievement(|a| {
            a.mark_completed(lesson_id);
        })
    }

    async fn unlock_lesson(&self, lesson_id: &str) -> DbResult<()> {
        let mut state = self.lock()?;
        state
            .progress
            .entry(lesson_id.to_string())
            .or_insert_with(|| LessonProgress::new(lesson_id, LessonStatus::Locked))
            .unlock();
        Ok(())
    }

    async fn apply_completion_effect(
        &self,
        lesson_id: &str,
        effect: &CompletionEffect,
    ) -> DbResult<bool> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let record = state
            .progress
            .get_mut(lesson_id)
            .ok_or_else(|| PersistenceError::Corrupt(format!("no progress for {}", lesson_id)))?;
        if record.marks.is_set(effect) {
            return Ok(false);
        }
        let achievement = state
            .achievement
            .as_mut()
            .ok_or_else(|| PersistenceError::Corrupt("achievement record missing".to_string()))?;

        match effect {
            CompletionEffect::CreditStars(stars) => achievement.add_stars(*stars),
            CompletionEffect::RecordStreak(today) => achievement.record_activity(*today),
            CompletionEffect::CountDailyTask(Some(target)) => {
                let task = state
                    .daily
                    .get_mut(&target.date)
                    .and_then(|set| set.task_mut(&target.task_id))
                    .ok_or_else(|| {
                        PersistenceError::Corrupt(format!(
                            "no daily task {} on {}",
                            target.task_id, target.date
                        ))
                    })?;
                achievement.count_task(task);
            }
            CompletionEffect::CountDailyTask(None) => {}
        }
        record.marks.set(effect);
        Ok(true)
    }

    async fn get_achievement(&self) -> DbResult<Option<Achievement>> {
        Ok(self.lock()?.achievement.clone())
    }

    async fn init_achievement(&self) -> DbResult<()> {
        let mut state = self.lock()?;
        if state.achievement.is_none() {
            state.achievement = Some(Achievement::new(Utc::now()));
        }
        Ok(())
    }

    async fn update_achievement(&self, patch: &AchievementPatch) -> DbResult<()> {
        self.with_achievement(|a| a.apply(patch))
    }

    async fn add_stars(&self, stars: u32) -> DbResult<()> {
        self.with_achievement(|a| a.add_stars(stars))
    }

    async fn add_badge(&self, badge_id: &str) -> DbResult<()> {
        self.with_achievement(|a| {
            a.add_badge(badge_id);
        })
    }

    async fn update_streak(&self, today: NaiveDate) -> DbResult<()> {
        self.with_achievement(|a| a.record_activity(today))
    }

    async fn get_daily_tasks(&self, date: NaiveDate) -> DbResult<Option<DailyTaskSet>> {
        Ok(self.lock()?.daily.get(&date).cloned())
    }

    async fn create_daily_tasks(&self, set: &DailyTaskSet) -> DbResult<()> {
        let mut state = self.lock()?;
        state.daily.entry(set.date).or_insert_with(|| set.clone());
        Ok(())
    }

    async fn update_daily_task(
        &self,
        date: NaiveDate,
        task_id: &str,
        progress: u32,
    ) -> DbResult<()> {
        let mut state = self.lock()?;
        let task = state
            .daily
            .get_mut(&date)
            .and_then(|set| set.task_mut(task_id))
            .ok_or_else(|| {
                PersistenceError::Corrupt(format!("no daily task {} on {}", task_id, date))
            })?;
        task.set_progress(progress);
        Ok(())
    }
}
