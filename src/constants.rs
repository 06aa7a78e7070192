//! Shared domain constants: positions, vowels, cut-off defaults, and team
//! names that mark a transfer row as unusable.

/// Default first year of the eligible season window.
pub const DEFAULT_CUT_OFF_LEFT: i32 = 1990;

/// Default last year of the eligible season window.
pub const DEFAULT_CUT_OFF_RIGHT: i32 = 2022;

/// The four main outfield/goalkeeper roles questions are phrased in.
pub const MAIN_POSITIONS: [&str; 4] = ["defender", "midfielder", "attacker", "goalkeeper"];

/// Transfer rows pointing at these pseudo-teams carry no usable linkage.
pub const TRANSFER_INVALID_TEAMS: [&str; 3] = ["retired", "without club", "unknown"];

pub const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Maps a specific position as recorded in the statistics store to the main
/// role used in question text. Unknown positions pass through unchanged.
pub fn specific_to_main_position(specific: &str) -> &str {
    match specific {
        "centre-back" | "right-back" | "left-back" | "wing-back" => "defender",
        "defensive midfield" | "central midfield" | "attacking midfield" | "right midfield"
        | "left midfield" => "midfielder",
        "centre-forward" | "striker" | "left winger" | "right winger" => "attacker",
        "goalkeeper" => "goalkeeper",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_positions_resolve_to_main() {
        assert_eq!(specific_to_main_position("centre-back"), "defender");
        assert_eq!(specific_to_main_position("attacking midfield"), "midfielder");
        assert_eq!(specific_to_main_position("striker"), "attacker");
        assert_eq!(specific_to_main_position("goalkeeper"), "goalkeeper");
    }

    #[test]
    fn test_unknown_position_passes_through() {
        assert_eq!(specific_to_main_position("sweeper"), "sweeper");
    }
}
