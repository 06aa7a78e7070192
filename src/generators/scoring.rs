//! Goal and appearance-count patterns. Threshold questions pick a number
//! just under the real total for true instances and just over it for false
//! ones, so both read equally plausible.

use std::collections::BTreeMap;

use anyhow::Result;
use rand::Rng;

use crate::facts::Appearance;
use crate::question::QuestionMap;
use crate::util::{
    format_player_tag, league_display, preprocess_player_name, resolve_counts, shorten_season,
};

use super::{as_of_year, eligible_for_team, push_question, sample, GenContext};

/// "Did $PLAYER ever score for $TEAM?"
pub fn player_scored_for_team<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER ever score for $TEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let (scorers, blanks) = split_by_goals(&inside);

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in
        [(&scorers, positive_count, true), (&blanks, negative_count, false)]
    {
        for (app, _) in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let text = format!("Did {player} ever score for {team}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER score more than $NUMBER goals for $TEAM?"
pub fn player_scored_more_than_number_goals<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER score more than $NUMBER goals for $TEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let (scorers, _) = split_by_goals(&inside);

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for (app, goals) in sample(rng, &scorers, quota) {
            let threshold = threshold_for(rng, *goals, truthful);
            let player = preprocess_player_name(&app.player_name);
            let text = format!("Did {player} score more than {threshold} goals for {team}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, truthful);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER score more than $NUMBER goals for $TEAM in the $SEASON season?"
pub fn player_scored_more_than_number_goals_in_season<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str =
        "Did $PLAYER score more than $NUMBER goals for $TEAM in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let seasons_with_goals: Vec<&Appearance> =
        inside.iter().filter(|a| a.goals > 0).collect();

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for app in sample(rng, &seasons_with_goals, quota) {
            let threshold = threshold_for(rng, app.goals, truthful);
            let player = preprocess_player_name(&app.player_name);
            let season = shorten_season(&app.season);
            let text = format!(
                "Did {player} score more than {threshold} goals for {team} in the {season} season?"
            );
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(
                &mut questions,
                text,
                TEMPLATE,
                Some(&app.season),
                tags,
                &team,
                truthful,
            );
        }
    }
    Ok(questions)
}

/// "Had $PLAYER scored for $TEAM as of $NUMBER?"
pub fn player_scored_for_team_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $PLAYER scored for $TEAM as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let (scorers, blanks) = split_by_goals(&inside);

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in
        [(&scorers, positive_count, true), (&blanks, negative_count, false)]
    {
        for (app, _) in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let text = format!("Had {player} scored for {team} as of {year}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Had $PLAYER scored for $TEAM in $LEAGUE as of $NUMBER?"
pub fn player_scored_for_team_as_of_limiter_in_league<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $PLAYER scored for $TEAM in $LEAGUE as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;

    // Goal totals per (player, league).
    let mut totals: BTreeMap<(i64, String), (&Appearance, i64)> = BTreeMap::new();
    for app in &inside {
        let entry = totals
            .entry((app.player_id, app.league.clone()))
            .or_insert((app, 0));
        entry.1 += app.goals;
    }
    let mut scorers = Vec::new();
    let mut blanks = Vec::new();
    for ((_, league), (app, goals)) in totals {
        if goals > 0 {
            scorers.push((app, league));
        } else {
            blanks.push((app, league));
        }
    }

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in
        [(&scorers, positive_count, true), (&blanks, negative_count, false)]
    {
        for (app, league) in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let display = league_display(league);
            let text = format!("Had {player} scored for {team} in {display} as of {year}?");
            let tags = vec![
                team.clone(),
                league.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER make more than $NUMBER appearances for $TEAM?"
pub fn player_played_more_than_number<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER make more than $NUMBER appearances for $TEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let totals = match_totals(&inside);

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for (app, matches) in sample(rng, &totals, quota) {
            let threshold = threshold_for(rng, *matches, truthful);
            let player = preprocess_player_name(&app.player_name);
            let text =
                format!("Did {player} make more than {threshold} appearances for {team}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, truthful);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER make fewer than $NUMBER appearances for $TEAM?"
pub fn player_played_less_than_number<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER make fewer than $NUMBER appearances for $TEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let totals = match_totals(&inside);

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for (app, matches) in sample(rng, &totals, quota) {
            // "fewer than" flips the threshold sides relative to "more than".
            let threshold = threshold_for(rng, *matches, !truthful);
            let player = preprocess_player_name(&app.player_name);
            let text =
                format!("Did {player} make fewer than {threshold} appearances for {team}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, truthful);
        }
    }
    Ok(questions)
}

/// "Was $PLAYER $TEAM's top scorer in the $SEASON season?"
pub fn player_was_team_top_scorer<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Was $PLAYER $TEAM's top scorer in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;

    // Best scorer per season, plus everyone who finished behind them.
    let mut by_season: BTreeMap<&str, Vec<&Appearance>> = BTreeMap::new();
    for app in &inside {
        by_season.entry(app.season.as_str()).or_default().push(app);
    }
    let mut top_scorers: Vec<&Appearance> = Vec::new();
    let mut runners_up: Vec<&Appearance> = Vec::new();
    for apps in by_season.values() {
        let Some(best) = apps.iter().filter(|a| a.goals > 0).max_by_key(|a| (a.goals, a.player_id))
        else {
            continue;
        };
        top_scorers.push(*best);
        runners_up.extend(apps.iter().filter(|a| a.goals < best.goals).copied());
    }

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [
        (&top_scorers, positive_count, true),
        (&runners_up, negative_count, false),
    ] {
        for app in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let season = shorten_season(&app.season);
            let text = format!("Was {player} {team}'s top scorer in the {season} season?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(
                &mut questions,
                text,
                TEMPLATE,
                Some(&app.season),
                tags,
                &team,
                answer,
            );
        }
    }
    Ok(questions)
}

/// Career goal totals per player, split into scorers and players who never
/// scored for the team.
#[allow(clippy::type_complexity)]
fn split_by_goals(apps: &[Appearance]) -> (Vec<(&Appearance, i64)>, Vec<(&Appearance, i64)>) {
    let mut totals: BTreeMap<i64, (&Appearance, i64)> = BTreeMap::new();
    for app in apps {
        let entry = totals.entry(app.player_id).or_insert((app, 0));
        entry.1 += app.goals;
    }
    let mut scorers = Vec::new();
    let mut blanks = Vec::new();
    for (app, goals) in totals.into_values() {
        if goals > 0 {
            scorers.push((app, goals));
        } else {
            blanks.push((app, goals));
        }
    }
    (scorers, blanks)
}

/// Career appearance totals per player, keeping players with at least one
/// recorded match.
fn match_totals(apps: &[Appearance]) -> Vec<(&Appearance, i64)> {
    let mut totals: BTreeMap<i64, (&Appearance, i64)> = BTreeMap::new();
    for app in apps {
        let entry = totals.entry(app.player_id).or_insert((app, 0));
        entry.1 += app.matches;
    }
    totals.into_values().filter(|(_, m)| *m > 0).collect()
}

/// Threshold below the real total when the claim should hold, above it when
/// it should not.
fn threshold_for<R: Rng + ?Sized>(rng: &mut R, actual: i64, truthful: bool) -> i64 {
    if truthful {
        let slack = rng.gen_range(1..=actual.min(3).max(1));
        (actual - slack).max(0)
    } else {
        actual + rng.gen_range(1..=5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_threshold_sides() {
        let mut rng = StdRng::seed_from_u64(5);
        for actual in 1..=30 {
            for _ in 0..20 {
                assert!(threshold_for(&mut rng, actual, true) < actual);
                assert!(threshold_for(&mut rng, actual, false) > actual);
            }
        }
    }
}
