//! Star-based level system (v0.4.0).
//!
//! Levels come from a static threshold table. A learner's level is the
//! highest entry whose `required_stars` is met; it never goes down.

use crate::curriculum::LevelConfig;
use serde::{Deserialize, Serialize};

/// Result of a level-up check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub leveled_up: bool,
    pub new_level: u32,
}

impl LevelUp {
    pub fn unchanged(level: u32) -> Self {
        Self {
            leveled_up: false,
            new_level: level,
        }
    }
}

/// Progress-bar data for the current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Stars held now
    pub current: u32,
    /// Stars needed for the next level (== current at max level)
    pub next: u32,
    /// 0.0 - 100.0
    pub progress_percent: f64,
}

/// Highest level whose threshold `stars` meets
pub fn level_for_stars(stars: u32, table: &[LevelConfig]) -> u32 {
    table
        .iter()
        .filter(|l| stars >= l.required_stars)
        .map(|l| l.level)
        .max()
        .unwrap_or(1)
}

/// Position inside the current level band
pub fn level_progress(stars: u32, level: u32, table: &[LevelConfig]) -> LevelProgress {
    let next_cfg = match table.iter().find(|l| l.level == level + 1) {
        Some(cfg) => cfg,
        None => {
            return LevelProgress {
                current: stars,
                next: stars,
                progress_percent: 100.0,
            }
        }
    };

    let floor = table
        .iter()
        .find(|l| l.level == level)
        .map(|l| l.required_stars)
        .unwrap_or(0);
    let span = next_cfg.required_stars.saturating_sub(floor);

    let pct = if span == 0 {
        100.0
    } else {
        (stars as f64 - floor as f64) / span as f64 * 100.0
    };

    LevelProgress {
        current: stars,
        next: next_cfg.required_stars,
        progress_percent: pct.clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Curriculum;

    #[test]
    fn test_level_for_stars_boundaries() {
        let table = Curriculum::kids_course().levels;
        assert_eq!(level_for_stars(0, &table), 1);
        assert_eq!(level_for_stars(49, &table), 1);
        assert_eq!(level_for_stars(50, &table), 2);
        assert_eq!(level_for_stars(149, &table), 2);
        assert_eq!(level_for_stars(150, &table), 3);
        assert_eq!(level_for_stars(10_000, &table), 5);
        assert_eq!(level_for_stars(10, &[]), 1);
    }

    #[test]
    fn test_level_progress_midway() {
        let table = Curriculum::kids_course().levels;
        let p = level_progress(100, 2, &table);
        assert_eq!(p.current, 100);
        assert_eq!(p.next, 150);
        assert!((p.progress_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_progress_max_level() {
        let table = Curriculum::kids_course().levels;
        let p = level_progress(620, 5, &table);
        assert_eq!(p.next, p.current);
        assert_eq!(p.progress_percent, 100.0);
    }

    #[test]
    fn test_level_progress_clamped() {
        let table = Curriculum::kids_course().levels;
        // Stored level lags behind stars until the next level-up check
        let p = level_progress(90, 1, &table);
        assert_eq!(p.progress_percent, 100.0);
        // Stars below the band floor
        let p = level_progress(10, 3, &table);
        assert_eq!(p.progress_percent, 0.0);
    }
}
