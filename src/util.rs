//! Formatting and linguistic helpers shared by every generator: balanced
//! true/false counts, difficulty inference, season and tag normalization,
//! and the small grammar fix-ups question text needs.

use chrono::NaiveDate;
use rand::Rng;
use unicode_normalization::UnicodeNormalization;

use crate::constants::{specific_to_main_position, VOWELS};
use crate::question::Difficulty;

/// Splits a requested count into positive/negative halves, positive first
/// when the count is odd.
pub fn resolve_counts(count: usize) -> (usize, usize) {
    (count / 2 + count % 2, count / 2)
}

/// Rewrites pattern-specific placeholder synonyms onto the canonical set so
/// templates from different generators compare alike.
pub fn standardize_template(template: &str) -> String {
    template
        .replace("$LEAGUE", "$COMPETITION")
        .replace("$FROMTEAM", "$TEAM")
        .replace("$TOTEAM", "$TEAM")
        .replace("$WINNER", "$TEAM")
        .replace("$NOWINNER", "$TEAM")
        .replace("$AGAINSTTEAM", "$TEAM")
        .replace("$MNUMBER", "$NUMBER")
        .replace("$SNUMBER", "$NUMBER")
}

/// Number of placeholder variables in a template.
pub fn placeholder_count(template: &str) -> usize {
    template.matches('$').count()
}

/// First year of a season name ("2013-2014" -> 2013, "2013" -> 2013).
pub fn season_first_year(season: &str) -> Option<i32> {
    season.split('-').next()?.trim().parse().ok()
}

/// Shortens "2013-2014" to "2013/14" for question text. Single-year names
/// pass through unchanged.
pub fn shorten_season(season: &str) -> String {
    match season.split_once('-') {
        Some((first, second)) if second.len() >= 4 => {
            format!("{}/{}", first, &second[2..])
        }
        _ => season.to_string(),
    }
}

/// Deterministic difficulty from template complexity and season recency.
///
/// More than three placeholders is hard unless the season started in 2010 or
/// later; at most two placeholders is easy unless the season started before
/// 2015; everything else is medium.
pub fn assess_difficulty(template: &str, season: Option<&str>) -> Difficulty {
    let vars = placeholder_count(template);
    let year = season.and_then(season_first_year);
    if vars > 3 {
        match year {
            Some(y) if y >= 2010 => {}
            _ => return Difficulty::Hard,
        }
    } else if vars <= 2 {
        match year {
            Some(y) if y < 2015 => {}
            _ => return Difficulty::Easy,
        }
    }
    Difficulty::Medium
}

/// Uniform random tier, for callers with no complexity signal to go on.
pub fn random_difficulty<R: Rng + ?Sized>(rng: &mut R) -> Difficulty {
    match rng.gen_range(0..3) {
        0 => Difficulty::Easy,
        1 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// Normalizes a tag name for canonical-store matching: lowercased, trimmed,
/// diacritics stripped down to ASCII.
pub fn preprocess_tag(tag: &str) -> String {
    tag.to_lowercase()
        .trim()
        .nfkd()
        .filter(char::is_ascii)
        .collect()
}

/// Player tag, disambiguated with the birth date when one is known:
/// `Name` or `Name_DD.MM.YYYY`.
pub fn format_player_tag(name: &str, birth_date: Option<NaiveDate>) -> String {
    match birth_date {
        Some(date) => format!("{}_{}", name, date.format("%d.%m.%Y")),
        None => name.to_string(),
    }
}

/// Restores apostrophes dropped from names in the source data: a pair of
/// uppercase letters followed by a lowercase one reads as a collapsed
/// apostrophe ("OHara" -> "O'Hara").
pub fn preprocess_player_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 2);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        let next_two_upper_lower = c.is_ascii_uppercase()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_uppercase())
            && chars.get(i + 2).is_some_and(|n| n.is_ascii_lowercase());
        if next_two_upper_lower {
            out.push('\'');
        }
    }
    out
}

pub fn is_vowel_start(s: &str) -> bool {
    s.chars()
        .next()
        .map(|c| VOWELS.contains(&c.to_ascii_lowercase()))
        .unwrap_or(false)
}

/// "a" or "an" for the given noun phrase.
pub fn indefinite_article(s: &str) -> &'static str {
    if is_vowel_start(s) {
        "an"
    } else {
        "a"
    }
}

/// True for league names that carry their own article ("La Liga",
/// "Le Championnat") and must not get an English "the".
pub fn is_league_with_article(league: &str) -> bool {
    league
        .to_lowercase()
        .split(' ')
        .any(|word| word == "la" || word == "le")
}

/// League name as it should read inside a sentence.
pub fn league_display(league: &str) -> String {
    if is_league_with_article(league) {
        league.to_string()
    } else {
        format!("the {league}")
    }
}

/// Main role used in question text for a specific recorded position.
pub fn resolve_position(actual_position: &str) -> String {
    specific_to_main_position(&actual_position.to_lowercase()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_counts_balanced() {
        for n in 0..50 {
            let (pos, neg) = resolve_counts(n);
            assert_eq!(pos + neg, n);
            assert!(pos == neg || pos == neg + 1);
        }
        assert_eq!(resolve_counts(7), (4, 3));
        assert_eq!(resolve_counts(8), (4, 4));
    }

    #[test]
    fn test_standardize_template_synonyms() {
        let std = standardize_template("Did $PLAYER move to $TOTEAM from $FROMTEAM in $LEAGUE?");
        assert_eq!(std, "Did $PLAYER move to $TEAM from $TEAM in $COMPETITION?");
        let std = standardize_template("$WINNER beat $NOWINNER $MNUMBER-$SNUMBER");
        assert_eq!(std, "$TEAM beat $TEAM $NUMBER-$NUMBER");
    }

    #[test]
    fn test_assess_difficulty_boundaries() {
        let four_vars = "Did $PLAYER wear $NUMBER for $TEAM in $SEASON?";
        let three_vars = "Did $PLAYER score more than $NUMBER goals for $TEAM?";
        let two_vars = "Did $PLAYER ever play for $TEAM?";

        assert_eq!(assess_difficulty(four_vars, Some("2005-2006")), Difficulty::Hard);
        assert_eq!(assess_difficulty(four_vars, None), Difficulty::Hard);
        assert_eq!(assess_difficulty(four_vars, Some("2012-2013")), Difficulty::Medium);
        assert_eq!(assess_difficulty(three_vars, None), Difficulty::Medium);
        assert_eq!(assess_difficulty(two_vars, Some("2016-2017")), Difficulty::Easy);
        assert_eq!(assess_difficulty(two_vars, None), Difficulty::Easy);
        assert_eq!(assess_difficulty(two_vars, Some("2013-2014")), Difficulty::Medium);
    }

    #[test]
    fn test_random_difficulty_covers_all_tiers() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(17);
        let mut seen = [false; 3];
        for _ in 0..300 {
            match random_difficulty(&mut rng) {
                Difficulty::Easy => seen[0] = true,
                Difficulty::Medium => seen[1] = true,
                Difficulty::Hard => seen[2] = true,
            }
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_shorten_season() {
        assert_eq!(shorten_season("2013-2014"), "2013/14");
        assert_eq!(shorten_season("1999-2000"), "1999/00");
        assert_eq!(shorten_season("2013"), "2013");
    }

    #[test]
    fn test_preprocess_tag_strips_diacritics() {
        assert_eq!(preprocess_tag(" Müller "), "muller");
        assert_eq!(preprocess_tag("Atlético Madrid"), "atletico madrid");
        assert_eq!(preprocess_tag("Premier League"), "premier league");
    }

    #[test]
    fn test_format_player_tag() {
        let date = NaiveDate::from_ymd_opt(1987, 6, 24).unwrap();
        assert_eq!(
            format_player_tag("Lionel Messi", Some(date)),
            "Lionel Messi_24.06.1987"
        );
        assert_eq!(format_player_tag("Lionel Messi", None), "Lionel Messi");
    }

    #[test]
    fn test_preprocess_player_name_restores_apostrophe() {
        assert_eq!(preprocess_player_name("Shane OHara"), "Shane O'Hara");
        assert_eq!(preprocess_player_name("NGolo Kante"), "N'Golo Kante");
        // Plain names and all-caps runs without a lowercase tail are untouched.
        assert_eq!(preprocess_player_name("Paul Scholes"), "Paul Scholes");
    }

    #[test]
    fn test_articles() {
        assert_eq!(indefinite_article("attacker"), "an");
        assert_eq!(indefinite_article("defender"), "a");
        assert!(is_vowel_start("Everton"));
        assert!(!is_vowel_start("Chelsea"));
    }

    #[test]
    fn test_league_display() {
        assert_eq!(league_display("Premier League"), "the Premier League");
        assert_eq!(league_display("La Liga"), "La Liga");
        assert_eq!(league_display("Le Championnat"), "Le Championnat");
    }

    #[test]
    fn test_season_first_year() {
        assert_eq!(season_first_year("2005-2006"), Some(2005));
        assert_eq!(season_first_year("2005"), Some(2005));
        assert_eq!(season_first_year("not a season"), None);
    }
}
