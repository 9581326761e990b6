//! Progress Database v0.4.0 - SQLite-backed learner progress
//!
//! On-device storage for one learner.
//!
//! Schema:
//! - lesson_progress: one row per lesson ever touched, with its completion marks
//! - achievement: singleton row (id = 1); completed lessons and badges as JSON arrays
//! - daily_tasks: one row per calendar date; task list as JSON
//!
//! Read-modify-write operations run inside a transaction so a failure never
//! leaves half a record behind.

use crate::db::{DbResult, ProgressDb};
use crate::error::PersistenceError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use forge_shared::{
    Achievement, AchievementPatch, CompletionEffect, CompletionMarks, CompletionMetadata,
    DailyTaskItem, DailyTaskSet, LessonProgress, LessonStatus, ProgressPatch,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed progress database
pub struct SqliteProgressDb {
    conn: Mutex<Connection>,
}

impl SqliteProgressDb {
    /// Open or create the database at `path`
    pub fn open_at<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path_ref)?;

        // WAL for better concurrent access from UI and CLI
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init_schema(&conn)?;

        debug!("Opened progress database at {}", path_ref.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory database (tests)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init_schema(conn: &Connection) -> DbResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS lesson_progress (
                lesson_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                stars_earned INTEGER NOT NULL DEFAULT 0,
                time_spent_secs INTEGER NOT NULL DEFAULT 0,
                started_at TEXT,
                completed_at TEXT,
                stars_credited INTEGER NOT NULL DEFAULT 0,
                streak_recorded INTEGER NOT NULL DEFAULT 0,
                daily_counted INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS achievement (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_stars INTEGER NOT NULL,
                level INTEGER NOT NULL,
                current_streak INTEGER NOT NULL,
                longest_streak INTEGER NOT NULL,
                last_active_date TEXT,
                completed_lessons TEXT NOT NULL,
                badges TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_tasks (
                date TEXT PRIMARY KEY,
                id TEXT NOT NULL,
                tasks TEXT NOT NULL
            );
            "#,
        )?;
        Self::ensure_mark_columns(conn)
    }

    /// Files created before completion marks get the columns added. Lessons
    /// already completed there had every effect applied.
    fn ensure_mark_columns(conn: &Connection) -> DbResult<()> {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('lesson_progress')
             WHERE name = 'stars_credited'",
            [],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Ok(());
        }

        let tx = conn.unchecked_transaction()?;
        for column in ["stars_credited", "streak_recorded", "daily_counted"] {
            tx.execute_batch(&format!(
                "ALTER TABLE lesson_progress ADD COLUMN {} INTEGER NOT NULL DEFAULT 0",
                column
            ))?;
        }
        let migrated = tx.execute(
            "UPDATE lesson_progress
             SET stars_credited = 1, streak_recorded = 1, daily_counted = 1
             WHERE status = 'completed'",
            [],
        )?;
        tx.commit()?;
        debug!(migrated, "Added completion mark columns");
        Ok(())
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Internal("database lock poisoned".to_string()))
    }

    /// Load, mutate and store a lesson row in one transaction
    fn mutate_progress<F>(&self, lesson_id: &str, initial: LessonStatus, f: F) -> DbResult<()>
    where
        F: FnOnce(&mut LessonProgress),
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut record = read_progress(&tx, lesson_id)?
            .unwrap_or_else(|| LessonProgress::new(lesson_id, initial));
        f(&mut record);
        write_progress(&tx, &record)?;
        tx.commit()?;
        Ok(())
    }

    /// Load, mutate and store the achievement row in one transaction
    fn mutate_achievement<F>(&self, f: F) -> DbResult<()>
    where
        F: FnOnce(&mut Achievement),
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut achievement = read_achievement(&tx)?
            .ok_or_else(|| PersistenceError::Corrupt("achievement record missing".to_string()))?;
        f(&mut achievement);
        write_achievement(&tx, &achievement)?;
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// Row helpers
// ============================================================================

fn read_progress(conn: &Connection, lesson_id: &str) -> DbResult<Option<LessonProgress>> {
    let row = conn
        .query_row(
            "SELECT lesson_id, status, stars_earned, time_spent_secs, started_at, completed_at,
                    stars_credited, streak_recorded, daily_counted
             FROM lesson_progress WHERE lesson_id = ?1",
            params![lesson_id],
            progress_row,
        )
        .optional()?;
    row.map(progress_from_row).transpose()
}

type ProgressRow = (
    String,
    String,
    i64,
    i64,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    CompletionMarks,
);

fn progress_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProgressRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        CompletionMarks {
            stars_credited: row.get(6)?,
            streak_recorded: row.get(7)?,
            daily_counted: row.get(8)?,
        },
    ))
}

fn progress_from_row(row: ProgressRow) -> DbResult<LessonProgress> {
    let (lesson_id, status, stars, secs, started_at, completed_at, marks) = row;
    let status = status
        .parse::<LessonStatus>()
        .map_err(|e| PersistenceError::Corrupt(format!("lesson {}: {}", lesson_id, e)))?;
    Ok(LessonProgress {
        lesson_id,
        status,
        stars_earned: stars.max(0) as u32,
        time_spent_secs: secs.max(0) as u64,
        started_at,
        completed_at,
        marks,
    })
}

fn write_progress(conn: &Connection, p: &LessonProgress) -> DbResult<()> {
    conn.execute(
        "INSERT INTO lesson_progress
            (lesson_id, status, stars_earned, time_spent_secs, started_at, completed_at,
             stars_credited, streak_recorded, daily_counted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(lesson_id) DO UPDATE SET
            status = excluded.status,
            stars_earned = excluded.stars_earned,
            time_spent_secs = excluded.time_spent_secs,
            started_at = excluded.started_at,
            completed_at = excluded.completed_at,
            stars_credited = excluded.stars_credited,
            streak_recorded = excluded.streak_recorded,
            daily_counted = excluded.daily_counted",
        params![
            &p.lesson_id,
            p.status.as_str(),
            p.stars_earned as i64,
            p.time_spent_secs as i64,
            p.started_at,
            p.completed_at,
            p.marks.stars_credited,
            p.marks.streak_recorded,
            p.marks.daily_counted
        ],
    )?;
    Ok(())
}

fn read_achievement(conn: &Connection) -> DbResult<Option<Achievement>> {
    let row = conn
        .query_row(
            "SELECT total_stars, level, current_streak, longest_streak, last_active_date,
                    completed_lessons, badges, created_at
             FROM achievement WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<NaiveDate>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, DateTime<Utc>>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((stars, level, streak, longest, last_active, completed, badges, created_at)) = row
    else {
        return Ok(None);
    };

    let completed_lessons: BTreeSet<String> = serde_json::from_str(&completed)?;
    let badges: BTreeSet<String> = serde_json::from_str(&badges)?;

    Ok(Some(Achievement {
        total_stars: stars.max(0) as u32,
        level: level.max(1) as u32,
        current_streak: streak.max(0) as u32,
        longest_streak: longest.max(0) as u32,
        last_active_date: last_active,
        completed_lessons,
        badges,
        created_at,
    }))
}

fn write_achievement(conn: &Connection, a: &Achievement) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO achievement
            (id, total_stars, level, current_streak, longest_streak, last_active_date,
             completed_lessons, badges, created_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            a.total_stars as i64,
            a.level as i64,
            a.current_streak as i64,
            a.longest_streak as i64,
            a.last_active_date,
            serde_json::to_string(&a.completed_lessons)?,
            serde_json::to_string(&a.badges)?,
            a.created_at
        ],
    )?;
    Ok(())
}

fn read_daily(conn: &Connection, date: NaiveDate) -> DbResult<Option<DailyTaskSet>> {
    let row = conn
        .query_row(
            "SELECT id, tasks FROM daily_tasks WHERE date = ?1",
            params![date],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    match row {
        Some((id, tasks)) => {
            let tasks: Vec<DailyTaskItem> = serde_json::from_str(&tasks)?;
            Ok(Some(DailyTaskSet { id, date, tasks }))
        }
        None => Ok(None),
    }
}

fn write_daily_tasks(conn: &Connection, set: &DailyTaskSet) -> DbResult<()> {
    conn.execute(
        "UPDATE daily_tasks SET tasks = ?1 WHERE date = ?2",
        params![serde_json::to_string(&set.tasks)?, set.date],
    )?;
    Ok(())
}

fn missing_task(task_id: &str, date: NaiveDate) -> PersistenceError {
    PersistenceError::Corrupt(format!("no daily task {} on {}", task_id, date))
}

// ============================================================================
// Adapter
// ============================================================================

#[async_trait]
impl ProgressDb for SqliteProgressDb {
    async fn get_all_progress(&self) -> DbResult<Vec<LessonProgress>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT lesson_id, status, stars_earned, time_spent_secs, started_at, completed_at,
                    stars_credited, streak_recorded, daily_counted
             FROM lesson_progress ORDER BY lesson_id",
        )?;
        let rows = stmt
            .query_map([], progress_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(progress_from_row).collect()
    }

    async fn update_progress(&self, lesson_id: &str, patch: &ProgressPatch) -> DbResult<()> {
        self.mutate_progress(lesson_id, LessonStatus::Locked, |p| p.apply(patch))
    }

    async fn complete_lesson(
        &self,
        lesson_id: &str,
        stars_earned: u32,
        metadata: &CompletionMetadata,
    ) -> DbResult<()> {
        let now = Utc::now();
        self.mutate_progress(lesson_id, LessonStatus::InProgress, |p| {
            p.complete(stars_earned, metadata, now)
        })
    }

    async fn mark_lesson_completed(&self, lesson_id: &str) -> DbResult<()> {
        self.mutate_achievement(|a| {
            a.mark_completed(lesson_id);
        })
    }

    async fn unlock_lesson(&self, lesson_id: &str) -> DbResult<()> {
        self.mutate_progress(lesson_id, LessonStatus::Locked, |p| {
            p.unlock();
        })
    }

    async fn apply_completion_effect(
        &self,
        lesson_id: &str,
        effect: &CompletionEffect,
    ) -> DbResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut record = read_progress(&tx, lesson_id)?
            .ok_or_else(|| PersistenceError::Corrupt(format!("no progress for {}", lesson_id)))?;
        if record.marks.is_set(effect) {
            return Ok(false);
        }
        let mut achievement = read_achievement(&tx)?
            .ok_or_else(|| PersistenceError::Corrupt("achievement record missing".to_string()))?;

        match effect {
            CompletionEffect::CreditStars(stars) => achievement.add_stars(*stars),
            CompletionEffect::RecordStreak(today) => achievement.record_activity(*today),
            CompletionEffect::CountDailyTask(Some(target)) => {
                let mut set = read_daily(&tx, target.date)?
                    .ok_or_else(|| missing_task(&target.task_id, target.date))?;
                let task = set
                    .task_mut(&target.task_id)
                    .ok_or_else(|| missing_task(&target.task_id, target.date))?;
                achievement.count_task(task);
                write_daily_tasks(&tx, &set)?;
            }
            CompletionEffect::CountDailyTask(None) => {}
        }

        record.marks.set(effect);
        write_achievement(&tx, &achievement)?;
        write_progress(&tx, &record)?;
        tx.commit()?;
        Ok(true)
    }

    async fn get_achievement(&self) -> DbResult<Option<Achievement>> {
        let conn = self.conn()?;
        read_achievement(&conn)
    }

    async fn init_achievement(&self) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if read_achievement(&tx)?.is_none() {
            write_achievement(&tx, &Achievement::new(Utc::now()))?;
            debug!("Created achievement record");
        }
        tx.commit()?;
        Ok(())
    }

    async fn update_achievement(&self, patch: &AchievementPatch) -> DbResult<()> {
        self.mutate_achievement(|a| a.apply(patch))
    }

    async fn add_stars(&self, stars: u32) -> DbResult<()> {
        self.mutate_achievement(|a| a.add_stars(stars))
    }

    async fn add_badge(&self, badge_id: &str) -> DbResult<()> {
        self.mutate_achievement(|a| {
            a.add_badge(badge_id);
        })
    }

    async fn update_streak(&self, today: NaiveDate) -> DbResult<()> {
        self.mutate_achievement(|a| a.record_activity(today))
    }

    async fn get_daily_tasks(&self, date: NaiveDate) -> DbResult<Option<DailyTaskSet>> {
        let conn = self.conn()?;
        read_daily(&conn, date)
    }

    async fn create_daily_tasks(&self, set: &DailyTaskSet) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO daily_tasks (date, id, tasks) VALUES (?1, ?2, ?3)",
            params![set.date, &set.id, serde_json::to_string(&set.tasks)?],
        )?;
        Ok(())
    }

    async fn update_daily_task(
        &self,
        date: NaiveDate,
        task_id: &str,
        progress: u32,
    ) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut set = read_daily(&tx, date)?
            .ok_or_else(|| PersistenceError::Corrupt(format!("no daily tasks for {}", date)))?;
        let task = set
            .task_mut(task_id)
            .ok_or_else(|| missing_task(task_id, date))?;
        task.set_progress(progress);

        write_daily_tasks(&tx, &set)?;
        tx.commit()?;
        Ok(())
    }
}
