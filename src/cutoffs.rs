//! Per-team eligible season windows. A fact only feeds question generation
//! when its season (or year) falls inside the inclusive `[left, right]`
//! window configured for the team, with crate-wide defaults as fallback.

use std::collections::HashMap;

use crate::constants::{DEFAULT_CUT_OFF_LEFT, DEFAULT_CUT_OFF_RIGHT};
use crate::util::season_first_year;

#[derive(Debug, Clone)]
pub struct CutOffs {
    left: HashMap<i64, i32>,
    right: HashMap<i64, i32>,
    default_left: i32,
    default_right: i32,
}

impl Default for CutOffs {
    fn default() -> Self {
        CutOffs {
            left: HashMap::new(),
            right: HashMap::new(),
            default_left: DEFAULT_CUT_OFF_LEFT,
            default_right: DEFAULT_CUT_OFF_RIGHT,
        }
    }
}

impl CutOffs {
    pub fn new(default_left: i32, default_right: i32) -> CutOffs {
        CutOffs {
            left: HashMap::new(),
            right: HashMap::new(),
            default_left,
            default_right,
        }
    }

    pub fn set_left(&mut self, team_id: i64, year: i32) {
        self.left.insert(team_id, year);
    }

    pub fn set_right(&mut self, team_id: i64, year: i32) {
        self.right.insert(team_id, year);
    }

    /// Inclusive `[left, right]` window for a team, defaults applied.
    pub fn window_for(&self, team_id: i64) -> (i32, i32) {
        (
            *self.left.get(&team_id).unwrap_or(&self.default_left),
            *self.right.get(&team_id).unwrap_or(&self.default_right),
        )
    }

    pub fn contains_year(&self, team_id: i64, year: i32) -> bool {
        let (left, right) = self.window_for(team_id);
        left <= year && year <= right
    }

    /// Whether a season name ("2013-2014") starts inside the team's window.
    /// Unparseable season names are never eligible.
    pub fn contains_season(&self, team_id: i64, season: &str) -> bool {
        season_first_year(season)
            .map(|year| self.contains_year(team_id, year))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_applies_to_unconfigured_teams() {
        let cutoffs = CutOffs::default();
        assert_eq!(cutoffs.window_for(99), (1990, 2022));
        assert!(cutoffs.contains_season(99, "1990-1991"));
        assert!(cutoffs.contains_season(99, "2022-2023"));
        assert!(!cutoffs.contains_season(99, "1989-1990"));
        assert!(!cutoffs.contains_season(99, "2023-2024"));
    }

    #[test]
    fn test_team_override_narrows_window() {
        let mut cutoffs = CutOffs::default();
        cutoffs.set_left(52, 2014);
        assert!(!cutoffs.contains_season(52, "2013-2014"));
        assert!(cutoffs.contains_season(52, "2014-2015"));
        // Other teams keep the default.
        assert!(cutoffs.contains_season(53, "2013-2014"));
    }

    #[test]
    fn test_garbage_season_is_ineligible() {
        let cutoffs = CutOffs::default();
        assert!(!cutoffs.contains_season(1, "unknown"));
    }
}
