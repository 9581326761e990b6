//! Daily learning streaks (v0.4.0).
//!
//! A streak counts consecutive calendar days with at least one qualifying
//! learning action.

use chrono::NaiveDate;

/// Outcome of recording activity on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current_streak: u32,
    /// True when this activity extended or restarted the streak (first action of the day)
    pub advanced: bool,
}

/// Streak after activity on `today`.
///
/// Same day keeps the count, the day after `last_active` extends it, and any
/// gap (or no history) restarts at 1.
pub fn next_streak(last_active: Option<NaiveDate>, current: u32, today: NaiveDate) -> StreakUpdate {
    match last_active {
        Some(last) if last == today => StreakUpdate {
            current_streak: current.max(1),
            advanced: false,
        },
        Some(last) if last.succ_opt() == Some(today) => StreakUpdate {
            current_streak: current + 1,
            advanced: true,
        },
        // A clock that moved backwards is treated like a gap
        _ => StreakUpdate {
            current_streak: 1,
            advanced: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let u = next_streak(None, 0, day(10));
        assert_eq!(u.current_streak, 1);
        assert!(u.advanced);
    }

    #[test]
    fn test_same_day_keeps_streak() {
        let u = next_streak(Some(day(10)), 4, day(10));
        assert_eq!(u.current_streak, 4);
        assert!(!u.advanced);
    }

    #[test]
    fn test_next_day_extends() {
        let u = next_streak(Some(day(10)), 4, day(11));
        assert_eq!(u.current_streak, 5);
    }

    #[test]
    fn test_gap_resets() {
        let u = next_streak(Some(day(10)), 4, day(13));
        assert_eq!(u.current_streak, 1);
        let u = next_streak(Some(day(10)), 4, day(2));
        assert_eq!(u.current_streak, 1);
    }

    #[test]
    fn test_month_boundary() {
        let last = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
        let u = next_streak(Some(last), 2, day(1));
        assert_eq!(u.current_streak, 3);
    }
}
