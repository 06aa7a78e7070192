//! Match-result patterns: venues, score lines, draws and head-to-heads.
//!
//! Teams meet the same opponent more than once per season, so a false
//! instance is only usable after checking it against every fixture in the
//! pool. A claim that actually happened must never be labelled false.

use std::collections::BTreeSet;

use anyhow::Result;
use rand::Rng;

use crate::facts::Fixture;
use crate::question::QuestionMap;
use crate::util::{resolve_counts, shorten_season};

use super::{push_question, sample, GenContext};

/// "Did $TEAM play against $AGAINSTTEAM at $STADIUM in the $SEASON season?"
pub fn team_vs_team_at_season_in_stadium<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str =
        "Did $TEAM play against $AGAINSTTEAM at $STADIUM in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let pool = eligible_fixtures(ctx, team_id)?;

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for fixture in sample(rng, &pool, quota) {
            let opponent = opponent_of(&team, fixture);
            let stadium = if truthful {
                fixture.stadium.clone()
            } else {
                match wrong_stadium(rng, &pool, &team, opponent, &fixture.season) {
                    Some(s) => s,
                    None => continue,
                }
            };
            let season = shorten_season(&fixture.season);
            let text = format!(
                "Did {team} play against {opponent} at {stadium} in the {season} season?"
            );
            let tags = vec![team.clone(), opponent.to_string(), fixture.league.clone()];
            push_question(
                &mut questions,
                text,
                TEMPLATE,
                Some(&fixture.season),
                tags,
                &team,
                truthful,
            );
        }
    }
    Ok(questions)
}

/// "Did the $SEASON match between $TEAM and $AGAINSTTEAM end $MNUMBER-$MNUMBER?"
pub fn season_with_final_result<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str =
        "Did the $SEASON match between $TEAM and $AGAINSTTEAM end $MNUMBER-$MNUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let pool = eligible_fixtures(ctx, team_id)?;

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for fixture in sample(rng, &pool, quota) {
            let (home_goals, away_goals) = if truthful {
                (fixture.home_goals, fixture.away_goals)
            } else {
                fake_score(rng, fixture.home_goals, fixture.away_goals)
            };
            let season = shorten_season(&fixture.season);
            let (home, away) = (&fixture.home_team, &fixture.away_team);
            let text = format!(
                "Did the {season} match between {home} and {away} end {home_goals}-{away_goals}?"
            );
            let tags = vec![
                fixture.home_team.clone(),
                fixture.away_team.clone(),
                fixture.league.clone(),
            ];
            push_question(
                &mut questions,
                text,
                TEMPLATE,
                Some(&fixture.season),
                tags,
                &team,
                truthful,
            );
        }
    }
    Ok(questions)
}

/// "Did $TEAM and $AGAINSTTEAM draw their match in the $SEASON season?"
pub fn season_without_final_result<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $TEAM and $AGAINSTTEAM draw their match in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let pool = eligible_fixtures(ctx, team_id)?;
    let draws: Vec<&Fixture> = pool.iter().filter(|f| f.home_goals == f.away_goals).collect();
    let decisive: Vec<&Fixture> = pool.iter().filter(|f| f.home_goals != f.away_goals).collect();

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [(&draws, positive_count, true), (&decisive, negative_count, false)] {
        for fixture in sample(rng, pool, quota) {
            let season = shorten_season(&fixture.season);
            let (home, away) = (&fixture.home_team, &fixture.away_team);
            let text = format!("Did {home} and {away} draw their match in the {season} season?");
            let tags = vec![
                fixture.home_team.clone(),
                fixture.away_team.clone(),
                fixture.league.clone(),
            ];
            push_question(
                &mut questions,
                text,
                TEMPLATE,
                Some(&fixture.season),
                tags,
                &team,
                answer,
            );
        }
    }
    Ok(questions)
}

/// "Did $WINNER beat $NOWINNER in the $SEASON season?"
pub fn winner_beat_no_winner_in_season<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $WINNER beat $NOWINNER in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let pool = eligible_fixtures(ctx, team_id)?;
    let decisive: Vec<&Fixture> = pool.iter().filter(|f| f.home_goals != f.away_goals).collect();
    // Every (winner, loser, season) that really happened. The loser of one
    // leg may have won the other.
    let real_wins: BTreeSet<(&str, &str, &str)> = decisive
        .iter()
        .map(|f| {
            if f.home_goals > f.away_goals {
                (f.home_team.as_str(), f.away_team.as_str(), f.season.as_str())
            } else {
                (f.away_team.as_str(), f.home_team.as_str(), f.season.as_str())
            }
        })
        .collect();

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for fixture in sample(rng, &decisive, quota) {
            let (winner, loser) = if fixture.home_goals > fixture.away_goals {
                (&fixture.home_team, &fixture.away_team)
            } else {
                (&fixture.away_team, &fixture.home_team)
            };
            // The false instance claims the loser won, which only works when
            // the loser did not win another meeting that season.
            if !truthful
                && real_wins.contains(&(loser.as_str(), winner.as_str(), fixture.season.as_str()))
            {
                continue;
            }
            let (first, second) = if truthful { (winner, loser) } else { (loser, winner) };
            let season = shorten_season(&fixture.season);
            let text = format!("Did {first} beat {second} in the {season} season?");
            let tags = vec![
                fixture.home_team.clone(),
                fixture.away_team.clone(),
                fixture.league.clone(),
            ];
            push_question(
                &mut questions,
                text,
                TEMPLATE,
                Some(&fixture.season),
                tags,
                &team,
                truthful,
            );
        }
    }
    Ok(questions)
}

fn eligible_fixtures(ctx: &GenContext<'_>, team_id: i64) -> Result<Vec<Fixture>> {
    let fixtures = ctx.facts.fixtures_for_team(team_id)?;
    Ok(fixtures
        .into_iter()
        .filter(|f| ctx.cutoffs.contains_season(team_id, &f.season))
        .collect())
}

fn opponent_of<'a>(team: &str, fixture: &'a Fixture) -> &'a str {
    if fixture.home_team == team {
        &fixture.away_team
    } else {
        &fixture.home_team
    }
}

/// A venue drawn from another fixture where the team never met this
/// opponent in this season. Both legs of a pairing are real meetings.
fn wrong_stadium<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[Fixture],
    team: &str,
    opponent: &str,
    season: &str,
) -> Option<String> {
    let met_at: BTreeSet<&str> = pool
        .iter()
        .filter(|f| f.season == season && opponent_of(team, f) == opponent)
        .map(|f| f.stadium.as_str())
        .collect();
    let candidates: Vec<&str> = pool
        .iter()
        .map(|f| f.stadium.as_str())
        .filter(|s| !met_at.contains(s))
        .collect();
    sample(rng, &candidates, 1).first().map(|s| s.to_string())
}

/// A score line different from the real one.
fn fake_score<R: Rng + ?Sized>(rng: &mut R, home: i64, away: i64) -> (i64, i64) {
    if home != away && rng.gen_bool(0.5) {
        // Flipping a decisive result is the most plausible lie.
        (away, home)
    } else {
        let bump = rng.gen_range(1..=3);
        if rng.gen_bool(0.5) {
            (home + bump, away)
        } else {
            (home, away + bump)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::cutoffs::CutOffs;
    use crate::facts::FactRepository;
    use crate::testing::{add_fixture, add_league, add_team, stats_db};

    // Arsenal and Chelsea meet twice in 2002-2003, each winning at home.
    fn double_leg_facts(with_third_venue: bool) -> FactRepository {
        let conn = stats_db().unwrap();
        add_league(&conn, 1, "Premier League", None).unwrap();
        add_team(&conn, 1, "Arsenal", "Emirates Stadium", None).unwrap();
        add_team(&conn, 2, "Chelsea", "Stamford Bridge", None).unwrap();
        add_fixture(&conn, 1, 2, 1, "2002-2003", "Emirates Stadium", 2, 0).unwrap();
        add_fixture(&conn, 2, 1, 1, "2002-2003", "Stamford Bridge", 1, 0).unwrap();
        if with_third_venue {
            add_team(&conn, 3, "Liverpool", "Anfield", None).unwrap();
            add_fixture(&conn, 3, 1, 1, "2002-2003", "Anfield", 1, 2).unwrap();
        }
        FactRepository::from_connection(conn)
    }

    #[test]
    fn test_fake_score_differs_from_actual() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            assert_ne!(fake_score(&mut rng, 2, 1), (2, 1));
            assert_ne!(fake_score(&mut rng, 0, 0), (0, 0));
        }
    }

    #[test]
    fn test_wrong_venue_never_matches_a_real_meeting() {
        let facts = double_leg_facts(true);
        let cutoffs = CutOffs::default();
        let ctx = GenContext {
            facts: &facts,
            cutoffs: &cutoffs,
        };
        let real_meetings = [
            "Did Arsenal play against Chelsea at Emirates Stadium in the 2002/03 season?",
            "Did Arsenal play against Chelsea at Stamford Bridge in the 2002/03 season?",
            "Did Arsenal play against Liverpool at Anfield in the 2002/03 season?",
        ];

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let questions = team_vs_team_at_season_in_stadium(&ctx, &mut rng, 1, 10).unwrap();
            for (text, question) in &questions {
                if !question.answer {
                    assert!(
                        !real_meetings.contains(&text.as_str()),
                        "real fixture labelled false: {text}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reversed_winner_skipped_when_both_sides_won_a_leg() {
        let facts = double_leg_facts(false);
        let cutoffs = CutOffs::default();
        let ctx = GenContext {
            facts: &facts,
            cutoffs: &cutoffs,
        };

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let questions = winner_beat_no_winner_in_season(&ctx, &mut rng, 1, 10).unwrap();
            assert!(!questions.is_empty());
            for (text, question) in &questions {
                // Both reversed claims really happened, so only true
                // questions survive here.
                assert!(question.answer, "real win labelled false: {text}");
            }
        }
    }
}
