//! Achievement badges for the kids course (v0.4.0).
//!
//! Badge catalog plus the unlock rules evaluated after each lesson
//! completion. Rules read an achievement snapshot and report badge ids the
//! learner has earned but does not hold yet.

use crate::curriculum::Curriculum;
use crate::progress::Achievement;
use serde::Serialize;

pub const FIRST_STEP: &str = "first-step";
pub const WELCOME: &str = "welcome";
pub const PERFECT_SCORE: &str = "perfect-score";
pub const GRADUATE: &str = "graduate";

/// Streak thresholds and the badge each one unlocks
pub const STREAK_BADGES: &[(u32, &str)] = &[(3, "streak-3"), (7, "streak-7")];

/// Badge with ASCII symbol and description
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Badge {
    /// Unique identifier
    pub id: &'static str,
    /// ASCII badge symbol
    pub symbol: &'static str,
    /// Short name
    pub name: &'static str,
    /// How to earn it
    pub description: &'static str,
}

impl Badge {
    const fn new(
        id: &'static str,
        symbol: &'static str,
        name: &'static str,
        desc: &'static str,
    ) -> Self {
        Self {
            id,
            symbol,
            name,
            description: desc,
        }
    }
}

/// All badges a learner can earn
pub fn all_badges() -> Vec<Badge> {
    vec![
        // Learning badges
        Badge::new(WELCOME, "[*]", "Welcome", "Log in for the first time"),
        Badge::new(FIRST_STEP, "[1]", "First Step", "Complete lesson 1"),
        Badge::new("streak-3", "<3d>", "Little Flame", "Learn 3 days in a row"),
        Badge::new("streak-7", "<7d>", "Keep Going", "Learn 7 days in a row"),
        Badge::new(PERFECT_SCORE, "(100)", "Perfect Score", "Answer every quiz question correctly"),

        // Skill badges (unit completion)
        Badge::new("unit-1-complete", "{AI}", "AI Beginner", "Complete unit 1"),
        Badge::new("unit-2-complete", "{py}", "Python Rookie", "Complete unit 2"),
        Badge::new("unit-3-complete", "{img}", "Image Master", "Complete unit 3"),
        Badge::new("unit-4-complete", "{chat}", "Chat Master", "Complete unit 4"),
        Badge::new(GRADUATE, "|grad|", "Graduate", "Complete every lesson"),
    ]
}

pub fn badge(id: &str) -> Option<Badge> {
    all_badges().into_iter().find(|b| b.id == id)
}

/// Badges newly earned after completing `lesson_id`, in rule order:
/// first-step, unit badges (every unit), streak thresholds, graduate.
pub fn evaluate_badge_unlocks(
    lesson_id: &str,
    snapshot: &Achievement,
    curriculum: &Curriculum,
) -> Vec<String> {
    let mut unlocked = Vec::new();
    let mut award = |id: &str| {
        if !snapshot.has_badge(id) && !unlocked.iter().any(|u| u == id) {
            unlocked.push(id.to_string());
        }
    };

    if curriculum.first_lesson().map(|l| l.id.as_str()) == Some(lesson_id) {
        award(FIRST_STEP);
    }

    for unit in &curriculum.units {
        let complete = !unit.lessons.is_empty()
            && unit.lessons.iter().all(|l| snapshot.has_completed(&l.id));
        if complete {
            award(&unit.badge_id);
        }
    }

    for (days, id) in STREAK_BADGES {
        if snapshot.current_streak >= *days {
            award(id);
        }
    }

    if is_graduate(snapshot, curriculum) {
        award(GRADUATE);
    }

    unlocked
}

/// Every curriculum lesson has been completed
pub fn is_graduate(snapshot: &Achievement, curriculum: &Curriculum) -> bool {
    curriculum.total_lessons() > 0
        && curriculum.all_lessons().all(|l| snapshot.has_completed(&l.id))
}

/// Format held badges for display (ASCII style)
pub fn format_badges(held: &[String], max_display: usize) -> String {
    let symbols: Vec<&str> = held
        .iter()
        .filter_map(|id| all_badges().into_iter().find(|b| b.id == id).map(|b| b.symbol))
        .collect();
    if symbols.is_empty() {
        return String::new();
    }

    let shown = symbols.iter().take(max_display).copied().collect::<Vec<_>>().join(" ");
    if symbols.len() > max_display {
        format!("{} +{} more", shown, symbols.len() - max_display)
    } else {
        shown
    }
}

/// One-line celebration for a newly unlocked badge
pub fn format_badge_unlock(badge: &Badge) -> String {
    format!("{} Badge unlocked: {} - {}", badge.symbol, badge.name, badge.description)
}
