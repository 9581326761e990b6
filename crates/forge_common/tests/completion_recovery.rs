//! Lesson completion under adapter failures, concurrent callers and a
//! real SQLite file.

mod common;

use common::{fixture, initialized};
use forge_common::{
    Clock, CompletionStep, FixedClock, PersistenceError, ProgressStore, SqliteProgressDb,
    StoreError,
};
use forge_shared::achievements::FIRST_STEP;
use forge_shared::{CompletionMetadata, Curriculum, LessonStatus};
use std::sync::Arc;
use tempfile::tempdir;

fn meta() -> CompletionMetadata {
    CompletionMetadata::default()
}

/// Unpack a completion failure into (step, completed steps)
fn failed_step(err: StoreError) -> (CompletionStep, Vec<CompletionStep>) {
    match err {
        StoreError::Completion {
            step,
            completed,
            source,
            ..
        } => {
            assert!(matches!(source, PersistenceError::Unavailable(_)));
            (step, completed)
        }
        other => panic!("expected a completion failure, got {:?}", other),
    }
}

#[tokio::test]
async fn badge_failure_leaves_partial_cache_and_retry_finishes() {
    let mut fx = initialized().await;
    fx.store.start_lesson("lesson-1").await.unwrap();

    fx.db.fail_on("add_badge");
    let err = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err();
    let (step, completed) = failed_step(err);

    assert_eq!(step, CompletionStep::Badges);
    assert_eq!(
        completed,
        vec![
            CompletionStep::RecordCompletion,
            CompletionStep::MarkCompleted,
            CompletionStep::CreditStars,
            CompletionStep::UpdateStreak,
            CompletionStep::UnlockNext,
            CompletionStep::DailyTask,
        ]
    );

    // Stars landed, the progress cache was never reloaded
    assert_eq!(fx.store.total_stars(), 25);
    assert!(!fx.store.achievement().unwrap().has_badge(FIRST_STEP));
    assert_eq!(fx.store.lesson_status("lesson-1"), LessonStatus::InProgress);
    assert_eq!(fx.store.current_lesson(), Some("lesson-1"));

    fx.db.heal();
    let report = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();

    assert!(report.replay);
    assert_eq!(report.badges_unlocked, vec![FIRST_STEP.to_string()]);
    assert_eq!(fx.store.total_stars(), 25);
    assert_eq!(fx.store.lesson_status("lesson-1"), LessonStatus::Completed);
    assert_eq!(fx.store.lesson_status("lesson-2"), LessonStatus::Available);
    assert_eq!(fx.store.current_lesson(), None);
}

#[tokio::test]
async fn failure_before_marking_allows_full_retry() {
    let mut fx = initialized().await;

    fx.db.fail_on("mark_lesson_completed");
    let (step, completed) =
        failed_step(fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err());
    assert_eq!(step, CompletionStep::MarkCompleted);
    assert_eq!(completed, vec![CompletionStep::RecordCompletion]);
    assert_eq!(fx.store.total_stars(), 0);

    // Not yet in completed_lessons, so the retry is a first completion
    fx.db.heal();
    let report = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(!report.replay);
    assert_eq!(report.stars_credited, 15);
    assert_eq!(fx.store.total_stars(), 25);
}

#[tokio::test]
async fn star_failure_is_credited_on_retry() {
    let mut fx = initialized().await;

    fx.db.fail_on("add_stars");
    let (step, completed) =
        failed_step(fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err());
    assert_eq!(step, CompletionStep::CreditStars);
    assert_eq!(
        completed,
        vec![CompletionStep::RecordCompletion, CompletionStep::MarkCompleted]
    );
    assert_eq!(fx.store.total_stars(), 0);

    fx.db.heal();
    let report = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(!report.replay);
    assert_eq!(report.stars_credited, 15);
    assert_eq!(
        report.steps,
        vec![
            CompletionStep::CreditStars,
            CompletionStep::UpdateStreak,
            CompletionStep::UnlockNext,
            CompletionStep::DailyTask,
            CompletionStep::Badges,
            CompletionStep::LevelUp,
            CompletionStep::Reload,
            CompletionStep::ClearCurrent,
        ]
    );
    assert_eq!(fx.store.total_stars(), 25);
    assert_eq!(fx.store.current_streak(), 1);
    assert!(fx.store.daily_tasks().unwrap().task("learn-lesson").unwrap().completed);
    assert!(fx.store.achievement().unwrap().has_badge(FIRST_STEP));

    // Once everything has run, the next call credits nothing
    let again = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(again.replay);
    assert_eq!(fx.store.total_stars(), 25);
}

#[tokio::test]
async fn retry_credits_stars_from_the_stored_record() {
    let mut fx = initialized().await;

    fx.db.fail_on("add_stars");
    assert!(fx.store.complete_lesson("lesson-1", 12, &meta()).await.is_err());

    fx.db.heal();
    let report = fx.store.complete_lesson("lesson-1", 3, &meta()).await.unwrap();
    assert_eq!(report.stars_credited, 12);
    assert_eq!(fx.store.lesson_progress("lesson-1").unwrap().stars_earned, 12);
}

#[tokio::test]
async fn streak_failure_is_recorded_on_retry() {
    let mut fx = initialized().await;

    fx.db.fail_on("update_streak");
    let (step, _) =
        failed_step(fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err());
    assert_eq!(step, CompletionStep::UpdateStreak);
    assert_eq!(fx.store.total_stars(), 15);
    assert_eq!(fx.store.current_streak(), 0);

    fx.db.heal();
    let report = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(!report.replay);
    assert_eq!(report.stars_credited, 0);
    assert_eq!(fx.store.current_streak(), 1);
    assert_eq!(fx.store.total_stars(), 25);
}

#[tokio::test]
async fn daily_task_failure_is_counted_on_retry() {
    let mut fx = initialized().await;

    fx.db.fail_on("update_daily_task");
    let (step, completed) =
        failed_step(fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err());
    assert_eq!(step, CompletionStep::DailyTask);
    assert!(completed.contains(&CompletionStep::UnlockNext));
    assert_eq!(fx.store.total_stars(), 15);
    assert_eq!(
        fx.store.daily_tasks().unwrap().task("learn-lesson").unwrap().progress,
        0
    );

    fx.db.heal();
    let report = fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(!report.replay);
    assert_eq!(report.stars_credited, 0);
    assert!(report.daily_task.unwrap().completed);
    assert!(fx.store.daily_tasks().unwrap().task("learn-lesson").unwrap().completed);
    assert_eq!(fx.store.total_stars(), 25);
    assert_eq!(fx.store.current_streak(), 1);
}

#[tokio::test]
async fn unlock_failure_stops_before_daily_task() {
    let mut fx = initialized().await;

    fx.db.fail_on("unlock_lesson");
    let (step, completed) =
        failed_step(fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err());
    assert_eq!(step, CompletionStep::UnlockNext);
    assert!(!completed.contains(&CompletionStep::DailyTask));
    assert!(!fx.store.daily_tasks().unwrap().task("learn-lesson").unwrap().completed);

    fx.db.heal();
    fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(fx.store.daily_tasks().unwrap().task("learn-lesson").unwrap().completed);
    assert_eq!(fx.store.lesson_status("lesson-2"), LessonStatus::Available);
    assert_eq!(fx.store.total_stars(), 25);
}

#[tokio::test]
async fn unreadable_achievement_fails_before_any_write() {
    let mut fx = initialized().await;

    fx.db.fail_on("get_achievement");
    let (step, completed) =
        failed_step(fx.store.complete_lesson("lesson-1", 15, &meta()).await.unwrap_err());
    assert_eq!(step, CompletionStep::RecordCompletion);
    assert!(completed.is_empty());

    fx.db.heal();
    fx.store.load_progress().await.unwrap();
    assert_eq!(fx.store.lesson_status("lesson-1"), LessonStatus::Available);
}

#[tokio::test]
async fn initialize_failure_is_reported() {
    let mut fx = fixture();
    fx.db.fail_on("init_achievement");

    let err = fx.store.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Unavailable(_))
    ));
    assert!(err.persistence().unwrap().is_retryable());
    assert!(!fx.store.is_loading());
    assert!(fx.store.achievement().is_none());
}

#[tokio::test]
async fn failed_star_action_leaves_cache_untouched() {
    let mut fx = initialized().await;
    fx.store.add_stars(10).await.unwrap();

    fx.db.fail_on("add_stars");
    assert!(fx.store.add_stars(5).await.is_err());
    assert_eq!(fx.store.total_stars(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_double_completion_credits_once() {
    let fx = initialized().await;
    let shared = fx.store.into_shared();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&shared);
            tokio::spawn(async move {
                let mut store = store.lock().await;
                store.complete_lesson("lesson-1", 15, &meta()).await
            })
        })
        .collect();

    let mut replays = 0;
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        if report.replay {
            replays += 1;
        }
    }

    assert_eq!(replays, 1);
    let store = shared.lock().await;
    assert_eq!(store.total_stars(), 25);
    assert_eq!(store.completed_lessons_count(), 1);
}

#[tokio::test]
async fn sqlite_progress_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("progress.db");
    let curriculum = Arc::new(Curriculum::kids_course());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(common::day_one()));

    {
        let db = Arc::new(SqliteProgressDb::open_at(&path).unwrap());
        let mut store =
            ProgressStore::new(db, Arc::clone(&curriculum), Arc::clone(&clock)).unwrap();
        store.initialize().await.unwrap();
        store.complete_lesson("lesson-1", 15, &CompletionMetadata::timed(300)).await.unwrap();
        store.record_quiz_result("lesson-6", 5, 5).await.unwrap();
    }

    let db = Arc::new(SqliteProgressDb::open_at(&path).unwrap());
    let mut store = ProgressStore::new(db, curriculum, clock).unwrap();
    store.initialize().await.unwrap();

    assert_eq!(store.total_stars(), 15 + 10 + 15);
    assert_eq!(store.lesson_status("lesson-1"), LessonStatus::Completed);
    assert_eq!(store.lesson_status("lesson-2"), LessonStatus::Available);
    assert_eq!(store.lesson_status("lesson-3"), LessonStatus::Locked);
    assert_eq!(store.lesson_progress("lesson-1").unwrap().time_spent_secs, 300);

    let achievement = store.achievement().unwrap();
    assert!(achievement.has_badge(FIRST_STEP));
    assert!(achievement.has_badge("perfect-score"));
    assert_eq!(achievement.current_streak, 1);

    let tasks = store.daily_tasks().unwrap();
    assert_eq!(tasks.completed_count(), 2);

    // Replay against the reopened file
    let report = store.complete_lesson("lesson-1", 15, &meta()).await.unwrap();
    assert!(report.replay);
    assert_eq!(store.total_stars(), 40);
}
