//! The 27 per-pattern question generators.
//!
//! Every generator has the same shape: fetch eligible fact rows for the
//! team, split them into a true sub-universe and a false one, sample each
//! side without replacement up to the balanced counts, render the pattern's
//! template and tag the result. A generator degrades to fewer (or zero)
//! questions when its sub-universes run dry; it never fails for sparse data.

pub mod fixtures;
pub mod leagues;
pub mod membership;
pub mod scoring;
pub mod shirts;
pub mod transfers;

use std::collections::BTreeMap;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::cutoffs::CutOffs;
use crate::facts::{Appearance, FactRepository};
use crate::question::{Question, QuestionMap};
use crate::util::{assess_difficulty, standardize_template};

/// Everything a generator needs besides its quota and RNG.
pub struct GenContext<'a> {
    pub facts: &'a FactRepository,
    pub cutoffs: &'a CutOffs,
}

/// Closed set of question patterns, in the fixed invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    PlayerPlayedInTeam,
    PlayerPlayedInTeamAsPos,
    PlayerPlayedInTeamAsPosAtLeagueSeason,
    PlayerNeverPlayedInTeamAsOfLimiter,
    PlayerPlayedInTeamAsOfLimiter,
    FormerTeamPlayerAsOfLimiter,
    PlayerWoreShirtForTeamAtSeason,
    PlayerWoreShirtForTeamAsOfLimiter,
    TeamVsTeamAtSeasonInStadium,
    SeasonWithFinalResult,
    SeasonWithoutFinalResult,
    WinnerBeatNoWinnerInSeason,
    TeamPlayedInLeagueAsOfLimiter,
    TeamWinLeagueAsOfLimiter,
    TeamNeverWinLeagueAsOfLimiter,
    PlayerMovedToTeamFromTeam,
    PlayerJoinedOrLeftTeamInYear,
    PlayerScoredForTeam,
    PlayerScoredMoreThanNumberGoals,
    PlayerScoredMoreThanNumberGoalsInSeason,
    PlayerScoredForTeamAsOfLimiter,
    PlayerScoredForTeamAsOfLimiterInLeague,
    PlayerPlayedMoreThanNumber,
    PlayerPlayedLessThanNumber,
    PlayerWinLeagueWithTeam,
    PlayerWinLeagueWithTeamLimiter,
    PlayerWasTeamTopScorer,
}

/// Hand-tuned quota fractions per pattern. The orchestrator multiplies each
/// weight by the total requested count and truncates to an integer quota.
/// Weights sum to 1.0.
pub const GENERATOR_WEIGHTS: [(GeneratorKind, f64); 27] = [
    (GeneratorKind::PlayerPlayedInTeam, 0.008),
    (GeneratorKind::PlayerPlayedInTeamAsPos, 0.03),
    (GeneratorKind::PlayerPlayedInTeamAsPosAtLeagueSeason, 0.151),
    (GeneratorKind::PlayerNeverPlayedInTeamAsOfLimiter, 0.01),
    (GeneratorKind::PlayerPlayedInTeamAsOfLimiter, 0.044),
    (GeneratorKind::FormerTeamPlayerAsOfLimiter, 0.008),
    (GeneratorKind::PlayerWoreShirtForTeamAtSeason, 0.065),
    (GeneratorKind::PlayerWoreShirtForTeamAsOfLimiter, 0.01),
    (GeneratorKind::TeamVsTeamAtSeasonInStadium, 0.096),
    (GeneratorKind::SeasonWithFinalResult, 0.07),
    (GeneratorKind::SeasonWithoutFinalResult, 0.07),
    (GeneratorKind::WinnerBeatNoWinnerInSeason, 0.05),
    (GeneratorKind::TeamPlayedInLeagueAsOfLimiter, 0.01),
    (GeneratorKind::TeamWinLeagueAsOfLimiter, 0.01),
    (GeneratorKind::TeamNeverWinLeagueAsOfLimiter, 0.01),
    (GeneratorKind::PlayerMovedToTeamFromTeam, 0.05),
    (GeneratorKind::PlayerJoinedOrLeftTeamInYear, 0.04),
    (GeneratorKind::PlayerScoredForTeam, 0.03),
    (GeneratorKind::PlayerScoredMoreThanNumberGoals, 0.025),
    (GeneratorKind::PlayerScoredMoreThanNumberGoalsInSeason, 0.025),
    (GeneratorKind::PlayerScoredForTeamAsOfLimiter, 0.005),
    (GeneratorKind::PlayerScoredForTeamAsOfLimiterInLeague, 0.01),
    (GeneratorKind::PlayerPlayedMoreThanNumber, 0.0175),
    (GeneratorKind::PlayerPlayedLessThanNumber, 0.0175),
    (GeneratorKind::PlayerWinLeagueWithTeam, 0.05),
    (GeneratorKind::PlayerWinLeagueWithTeamLimiter, 0.01),
    (GeneratorKind::PlayerWasTeamTopScorer, 0.078),
];

impl GeneratorKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorKind::PlayerPlayedInTeam => "player_played_in_team",
            GeneratorKind::PlayerPlayedInTeamAsPos => "player_played_in_team_as_pos",
            GeneratorKind::PlayerPlayedInTeamAsPosAtLeagueSeason => {
                "player_played_in_team_as_pos_at_league_season"
            }
            GeneratorKind::PlayerNeverPlayedInTeamAsOfLimiter => {
                "player_never_played_in_team_as_of_limiter"
            }
            GeneratorKind::PlayerPlayedInTeamAsOfLimiter => "player_played_in_team_as_of_limiter",
            GeneratorKind::FormerTeamPlayerAsOfLimiter => "former_team_player_as_of_limiter",
            GeneratorKind::PlayerWoreShirtForTeamAtSeason => "player_wore_shirt_for_team_at_season",
            GeneratorKind::PlayerWoreShirtForTeamAsOfLimiter => {
                "player_wore_shirt_for_team_as_of_limiter"
            }
            GeneratorKind::TeamVsTeamAtSeasonInStadium => "team_vs_team_at_season_in_stadium",
            GeneratorKind::SeasonWithFinalResult => "season_with_final_result",
            GeneratorKind::SeasonWithoutFinalResult => "season_without_final_result",
            GeneratorKind::WinnerBeatNoWinnerInSeason => "winner_beat_no_winner_in_season",
            GeneratorKind::TeamPlayedInLeagueAsOfLimiter => "team_played_in_league_as_of_limiter",
            GeneratorKind::TeamWinLeagueAsOfLimiter => "team_win_league_as_of_limiter",
            GeneratorKind::TeamNeverWinLeagueAsOfLimiter => "team_never_win_league_as_of_limiter",
            GeneratorKind::PlayerMovedToTeamFromTeam => "player_moved_to_team_from_team",
            GeneratorKind::PlayerJoinedOrLeftTeamInYear => "player_joined_or_left_team_in_year",
            GeneratorKind::PlayerScoredForTeam => "player_scored_for_team",
            GeneratorKind::PlayerScoredMoreThanNumberGoals => {
                "player_scored_more_than_number_goals"
            }
            GeneratorKind::PlayerScoredMoreThanNumberGoalsInSeason => {
                "player_scored_more_than_number_goals_in_season"
            }
            GeneratorKind::PlayerScoredForTeamAsOfLimiter => "player_scored_for_team_as_of_limiter",
            GeneratorKind::PlayerScoredForTeamAsOfLimiterInLeague => {
                "player_scored_for_team_as_of_limiter_in_league"
            }
            GeneratorKind::PlayerPlayedMoreThanNumber => "player_played_more_than_number",
            GeneratorKind::PlayerPlayedLessThanNumber => "player_played_less_than_number",
            GeneratorKind::PlayerWinLeagueWithTeam => "player_win_league_with_team",
            GeneratorKind::PlayerWinLeagueWithTeamLimiter => "player_win_league_with_team_limiter",
            GeneratorKind::PlayerWasTeamTopScorer => "player_was_team_top_scorer",
        }
    }
}

/// Runs one generator. A zero quota short-circuits to an empty map before
/// any fact query runs.
pub fn run_generator<R: Rng + ?Sized>(
    kind: GeneratorKind,
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    if count == 0 {
        return Ok(QuestionMap::new());
    }
    match kind {
        GeneratorKind::PlayerPlayedInTeam => {
            membership::player_played_in_team(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerPlayedInTeamAsPos => {
            membership::player_played_in_team_as_pos(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerPlayedInTeamAsPosAtLeagueSeason => {
            membership::player_played_in_team_as_pos_at_league_season(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerNeverPlayedInTeamAsOfLimiter => {
            membership::player_never_played_in_team_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerPlayedInTeamAsOfLimiter => {
            membership::player_played_in_team_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::FormerTeamPlayerAsOfLimiter => {
            membership::former_team_player_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerWoreShirtForTeamAtSeason => {
            shirts::player_wore_shirt_for_team_at_season(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerWoreShirtForTeamAsOfLimiter => {
            shirts::player_wore_shirt_for_team_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::TeamVsTeamAtSeasonInStadium => {
            fixtures::team_vs_team_at_season_in_stadium(ctx, rng, team_id, count)
        }
        GeneratorKind::SeasonWithFinalResult => {
            fixtures::season_with_final_result(ctx, rng, team_id, count)
        }
        GeneratorKind::SeasonWithoutFinalResult => {
            fixtures::season_without_final_result(ctx, rng, team_id, count)
        }
        GeneratorKind::WinnerBeatNoWinnerInSeason => {
            fixtures::winner_beat_no_winner_in_season(ctx, rng, team_id, count)
        }
        GeneratorKind::TeamPlayedInLeagueAsOfLimiter => {
            leagues::team_played_in_league_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::TeamWinLeagueAsOfLimiter => {
            leagues::team_win_league_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::TeamNeverWinLeagueAsOfLimiter => {
            leagues::team_never_win_league_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerMovedToTeamFromTeam => {
            transfers::player_moved_to_team_from_team(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerJoinedOrLeftTeamInYear => {
            transfers::player_joined_or_left_team_in_year(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerScoredForTeam => {
            scoring::player_scored_for_team(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerScoredMoreThanNumberGoals => {
            scoring::player_scored_more_than_number_goals(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerScoredMoreThanNumberGoalsInSeason => {
            scoring::player_scored_more_than_number_goals_in_season(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerScoredForTeamAsOfLimiter => {
            scoring::player_scored_for_team_as_of_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerScoredForTeamAsOfLimiterInLeague => {
            scoring::player_scored_for_team_as_of_limiter_in_league(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerPlayedMoreThanNumber => {
            scoring::player_played_more_than_number(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerPlayedLessThanNumber => {
            scoring::player_played_less_than_number(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerWinLeagueWithTeam => {
            leagues::player_win_league_with_team(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerWinLeagueWithTeamLimiter => {
            leagues::player_win_league_with_team_limiter(ctx, rng, team_id, count)
        }
        GeneratorKind::PlayerWasTeamTopScorer => {
            scoring::player_was_team_top_scorer(ctx, rng, team_id, count)
        }
    }
}

// ---- helpers shared by the generator bodies ----

/// Samples `count` items without replacement; short pools yield everything.
pub(crate) fn sample<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    pool: &'a [T],
    count: usize,
) -> Vec<&'a T> {
    pool.choose_multiple(rng, count).collect()
}

/// One representative appearance row per player, ordered by player id.
pub(crate) fn dedupe_players(apps: &[Appearance]) -> Vec<&Appearance> {
    let mut seen: BTreeMap<i64, &Appearance> = BTreeMap::new();
    for app in apps {
        seen.entry(app.player_id).or_insert(app);
    }
    seen.into_values().collect()
}

/// Appearances for the team, restricted to its cut-off window.
pub(crate) fn eligible_for_team(
    ctx: &GenContext<'_>,
    team_id: i64,
) -> Result<Vec<Appearance>> {
    let apps = ctx.facts.appearances_for_team(team_id)?;
    Ok(apps
        .into_iter()
        .filter(|a| ctx.cutoffs.contains_season(team_id, &a.season))
        .collect())
}

/// Appearances of players who never played for the team, each restricted to
/// the window of the team they did appear for.
pub(crate) fn eligible_outside_team(
    ctx: &GenContext<'_>,
    team_id: i64,
) -> Result<Vec<Appearance>> {
    let apps = ctx.facts.appearances_outside_team(team_id)?;
    Ok(apps
        .into_iter()
        .filter(|a| ctx.cutoffs.contains_season(a.team_id, &a.season))
        .collect())
}

/// Reference year for "as of" phrasings: the right edge of the window.
pub(crate) fn as_of_year(ctx: &GenContext<'_>, team_id: i64) -> i32 {
    ctx.cutoffs.window_for(team_id).1
}

/// Random year inside the window for "since" phrasings.
pub(crate) fn since_year<R: Rng + ?Sized>(ctx: &GenContext<'_>, rng: &mut R, team_id: i64) -> i32 {
    let (left, right) = ctx.cutoffs.window_for(team_id);
    if left >= right {
        right
    } else {
        rng.gen_range(left..=right)
    }
}

/// Normalizes the template, infers difficulty and inserts the question.
/// The first claim for a text wins: positives render before negatives in
/// every generator, so a negative that happens to re-render a real fact is
/// dropped instead of overwriting the true answer.
pub(crate) fn push_question(
    questions: &mut QuestionMap,
    text: String,
    template: &str,
    season: Option<&str>,
    tags: Vec<String>,
    parent_tag: &str,
    answer: bool,
) {
    let template = standardize_template(template);
    let difficulty = assess_difficulty(&template, season);
    questions.entry(text).or_insert_with(|| Question {
        tags,
        parent_tags: vec![parent_tag.to_string()],
        difficulty,
        template,
        answer,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = GENERATOR_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-9, "weights sum to {sum}");
    }

    #[test]
    fn test_registry_covers_all_patterns_once() {
        assert_eq!(GENERATOR_WEIGHTS.len(), 27);
        for (i, (kind, _)) in GENERATOR_WEIGHTS.iter().enumerate() {
            for (other, _) in &GENERATOR_WEIGHTS[i + 1..] {
                assert_ne!(kind, other);
            }
        }
    }

    #[test]
    fn test_first_claim_for_a_text_wins() {
        let mut questions = QuestionMap::new();
        let text = "Did Arsenal beat Chelsea in the 2002/03 season?";
        let template = "Did $WINNER beat $NOWINNER in the $SEASON season?";
        push_question(
            &mut questions,
            text.to_string(),
            template,
            Some("2002-2003"),
            vec!["Arsenal".to_string()],
            "Arsenal",
            true,
        );
        push_question(
            &mut questions,
            text.to_string(),
            template,
            Some("2002-2003"),
            vec!["Arsenal".to_string()],
            "Arsenal",
            false,
        );
        assert_eq!(questions.len(), 1);
        assert!(questions[text].answer);
    }

    #[test]
    fn test_sample_caps_at_pool_size() {
        let mut rng = rand::thread_rng();
        let pool = vec![1, 2, 3];
        assert_eq!(sample(&mut rng, &pool, 10).len(), 3);
        assert_eq!(sample(&mut rng, &pool, 2).len(), 2);
        assert!(sample::<i32, _>(&mut rng, &[], 5).is_empty());
    }
}
