//! Output formatting - ASCII terminal views of learner progress
//!
//! Every renderer returns a String; printing is left to the commands.

use crate::cli::Lang;
use forge_common::{ActivityReport, CompletionReport, ProgressStore, QuizReport};
use forge_shared::achievements::{self, Badge};
use forge_shared::{
    Achievement, Curriculum, DailyTaskItem, DailyTaskSet, LessonKind, LessonStatus, LevelUp,
    LocalizedText,
};
use owo_colors::OwoColorize;
use std::fmt::Write;

pub const THIN_SEPARATOR: &str = "------------------------------------------------------------";

pub fn text(t: &LocalizedText, lang: Lang) -> &str {
    match lang {
        Lang::Zh => &t.zh,
        Lang::Ja => &t.ja,
    }
}

/// `[#####.....]` for a 0-100 percentage
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn status_marker(status: LessonStatus) -> String {
    match status {
        LessonStatus::Completed => "[x]".bright_green().to_string(),
        LessonStatus::InProgress => "[>]".yellow().to_string(),
        LessonStatus::Available => "[ ]".cyan().to_string(),
        LessonStatus::Locked => "[-]".dimmed().to_string(),
    }
}

fn kind_label(kind: LessonKind) -> &'static str {
    match kind {
        LessonKind::Video => "video",
        LessonKind::Interactive => "interactive",
        LessonKind::Project => "project",
        LessonKind::Quiz => "quiz",
    }
}

fn held_badges(achievement: Option<&Achievement>) -> Vec<String> {
    achievement.map_or_else(Vec::new, |a| a.badges.iter().cloned().collect())
}

pub fn render_status(store: &ProgressStore, lang: Lang) -> String {
    let mut out = String::new();
    let progress = store.level_progress();
    let title = store.level_info().map(|l| text(&l.title, lang)).unwrap_or("");

    let _ = writeln!(out, "{}", "[STUDYFORGE]".bold());
    let _ = writeln!(out, "{}", THIN_SEPARATOR);
    let _ = writeln!(out, "  Level      {} {}", store.level().to_string().bright_cyan(), title);
    let _ = writeln!(
        out,
        "  Stars      {} {} {}/{}",
        store.total_stars().to_string().yellow(),
        progress_bar(progress.progress_percent, 20),
        progress.current,
        progress.next
    );

    let longest = store.achievement().map_or(0, |a| a.longest_streak);
    let _ = writeln!(
        out,
        "  Streak     {} day(s) (best {})",
        store.current_streak(),
        longest
    );
    let _ = writeln!(
        out,
        "  Lessons    {}/{}",
        store.completed_lessons_count(),
        store.total_lessons()
    );

    let held = held_badges(store.achievement());
    let badges = achievements::format_badges(&held, 5);
    let _ = writeln!(
        out,
        "  Badges     {}",
        if badges.is_empty() { "none yet".dimmed().to_string() } else { badges }
    );

    if let Some(tasks) = store.daily_tasks() {
        let _ = writeln!(
            out,
            "  Today      {}/{} tasks done",
            tasks.completed_count(),
            tasks.tasks.len()
        );
    }
    out
}

pub fn render_lessons(store: &ProgressStore, unit_filter: Option<&str>, lang: Lang) -> String {
    let mut out = String::new();
    let curriculum = store.curriculum();

    for unit in curriculum.units.iter().filter(|u| unit_filter.map_or(true, |f| f == u.id)) {
        let done = unit
            .lessons
            .iter()
            .filter(|l| store.lesson_status(&l.id) == LessonStatus::Completed)
            .count();
        let _ = writeln!(
            out,
            "{} {} [{}/{}]",
            unit.id.bold(),
            text(&unit.title, lang),
            done,
            unit.lessons.len()
        );

        for lesson in &unit.lessons {
            let _ = writeln!(
                out,
                "  {} {:<10} {} ({}, {} min, {}*)",
                status_marker(store.lesson_status(&lesson.id)),
                lesson.id,
                text(&lesson.title, lang),
                kind_label(lesson.kind),
                lesson.duration_mins,
                lesson.stars_reward
            );
        }
        let _ = writeln!(out);
    }
    out
}

fn render_task(out: &mut String, task: &DailyTaskItem, lang: Lang) {
    let marker = if task.completed {
        "[x]".bright_green().to_string()
    } else {
        "[ ]".to_string()
    };
    let _ = writeln!(
        out,
        "  {} {}  {}/{}  +{}*",
        marker,
        text(&task.title, lang),
        task.progress,
        task.target,
        task.stars
    );
}

pub fn render_tasks(set: &DailyTaskSet, lang: Lang) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({}/{})",
        "[TODAY]".bold(),
        set.date,
        set.completed_count(),
        set.tasks.len()
    );
    for task in &set.tasks {
        render_task(&mut out, task, lang);
    }
    out
}

fn render_badge_unlocks(out: &mut String, ids: &[String]) {
    for badge in ids.iter().filter_map(|id| achievements::badge(id)) {
        let _ = writeln!(out, "  {}", achievements::format_badge_unlock(&badge).bright_magenta());
    }
}

fn render_level_up(out: &mut String, up: &LevelUp, curriculum: &Curriculum, lang: Lang) {
    if !up.leveled_up {
        return;
    }
    match curriculum.level_config(up.new_level) {
        Some(level) => {
            let _ = writeln!(
                out,
                "  {} Now level {}: {} (reward: {})",
                "[LEVEL UP]".bright_green().bold(),
                up.new_level,
                text(&level.title, lang),
                level.reward
            );
        }
        None => {
            let _ = writeln!(
                out,
                "  {} Now level {}",
                "[LEVEL UP]".bright_green().bold(),
                up.new_level
            );
        }
    }
}

fn render_daily_credit(out: &mut String, task: Option<&DailyTaskItem>, lang: Lang) {
    if let Some(task) = task {
        render_task(out, task, lang);
    }
}

pub fn render_completion(report: &CompletionReport, curriculum: &Curriculum, lang: Lang) -> String {
    let mut out = String::new();
    let title = curriculum
        .lesson(&report.lesson_id)
        .map(|l| text(&l.title, lang))
        .unwrap_or(&report.lesson_id);

    if report.replay {
        let _ = writeln!(
            out,
            "{} Already completed: {} (no stars credited)",
            "[=]".cyan(),
            title
        );
    } else {
        let _ = writeln!(
            out,
            "{} Lesson complete: {}  +{}*",
            "[OK]".bright_green(),
            title,
            report.stars_credited
        );
    }

    render_daily_credit(&mut out, report.daily_task.as_ref(), lang);
    render_badge_unlocks(&mut out, &report.badges_unlocked);
    render_level_up(&mut out, &report.level_up, curriculum, lang);

    if let Some(next) = report.next_lesson.as_deref().and_then(|id| curriculum.lesson(id)) {
        let _ = writeln!(out, "  Next: {} {}", next.id, text(&next.title, lang));
    } else if !report.replay && report.next_lesson.is_none() {
        let _ = writeln!(out, "  {}", "Course finished!".bright_green());
    }
    out
}

pub fn render_activity(report: &ActivityReport, curriculum: &Curriculum, lang: Lang) -> String {
    let mut out = String::new();
    match &report.task {
        Some(task) => render_task(&mut out, task, lang),
        None => {
            let _ = writeln!(out, "  {}", "Nothing left to count for today".dimmed());
        }
    }
    render_level_up(&mut out, &report.level_up, curriculum, lang);
    out
}

pub fn render_quiz(report: &QuizReport, curriculum: &Curriculum, lang: Lang) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} Quiz score: {}/{}",
        "[QUIZ]".bold(),
        report.score.correct,
        report.score.total
    );
    render_daily_credit(&mut out, report.task.as_ref(), lang);
    if report.perfect_badge {
        render_badge_unlocks(&mut out, &[achievements::PERFECT_SCORE.to_string()]);
    }
    render_level_up(&mut out, &report.level_up, curriculum, lang);
    out
}

pub fn render_badges(achievement: Option<&Achievement>) -> String {
    let mut out = String::new();
    let held = held_badges(achievement);
    let all: Vec<Badge> = achievements::all_badges();

    let _ = writeln!(out, "{} {}/{}", "[BADGES]".bold(), held.len(), all.len());
    for badge in &all {
        let line = format!("{:<7} {:<14} {}", badge.symbol, badge.name, badge.description);
        if held.iter().any(|h| h == badge.id) {
            let _ = writeln!(out, "  {}", line.bright_yellow());
        } else {
            let _ = writeln!(out, "  {}", line.dimmed());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_common::{FixedClock, MemoryProgressDb};
    use forge_shared::CompletionMetadata;
    use std::sync::Arc;

    async fn store() -> ProgressStore {
        let clock = FixedClock::on(chrono_date());
        let mut store = ProgressStore::new(
            Arc::new(MemoryProgressDb::new()),
            Arc::new(Curriculum::kids_course()),
            Arc::new(clock),
        )
        .unwrap();
        store.initialize().await.unwrap();
        store
    }

    fn chrono_date() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[....]");
        assert_eq!(progress_bar(50.0, 4), "[##..]");
        assert_eq!(progress_bar(140.0, 4), "[####]");
    }

    #[tokio::test]
    async fn test_status_view() {
        let s = store().await;
        let out = render_status(&s, Lang::Ja);
        assert!(out.contains("AI初心者"));
        assert!(out.contains("0/24"));
        assert!(out.contains("0/4 tasks"));
    }

    #[tokio::test]
    async fn test_lessons_view_filters_unit() {
        let s = store().await;
        let out = render_lessons(&s, Some("unit-2"), Lang::Zh);
        assert!(out.contains("lesson-7"));
        assert!(!out.contains("lesson-1 "));
        assert!(out.contains("[0/6]"));
    }

    #[tokio::test]
    async fn test_completion_view() {
        let mut s = store().await;
        let report = s
            .complete_lesson("lesson-1", 15, &CompletionMetadata::default())
            .await
            .unwrap();
        let out = render_completion(&report, s.curriculum(), Lang::Zh);
        assert!(out.contains("+15*"));
        assert!(out.contains("First Step"));
        assert!(out.contains("Next: lesson-2"));

        let replay = s
            .complete_lesson("lesson-1", 15, &CompletionMetadata::default())
            .await
            .unwrap();
        let out = render_completion(&replay, s.curriculum(), Lang::Zh);
        assert!(out.contains("Already completed"));
    }

    #[test]
    fn test_badges_view_counts_held() {
        let mut a = Achievement::new(chrono::Utc::now());
        a.add_badge("first-step");
        let out = render_badges(Some(&a));
        assert!(out.contains("1/10"));
        assert!(out.contains("Graduate"));
    }
}
