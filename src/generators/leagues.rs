//! Competition patterns: league membership, titles, and players lifting the
//! trophy with the team.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use rand::Rng;

use crate::facts::Appearance;
use crate::question::QuestionMap;
use crate::util::{
    format_player_tag, league_display, preprocess_player_name, resolve_counts,
    season_first_year,
};

use super::{
    as_of_year, eligible_for_team, push_question, sample, GenContext,
};

/// "Had $TEAM played in $LEAGUE as of $NUMBER?"
pub fn team_played_in_league_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $TEAM played in $LEAGUE as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let (played, _won) = league_history(ctx, team_id)?;
    let never_played: Vec<String> = ctx
        .facts
        .league_names()?
        .into_iter()
        .filter(|l| !played.contains(l))
        .collect();
    let played: Vec<String> = played.into_iter().collect();

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [
        (&played, positive_count, true),
        (&never_played, negative_count, false),
    ] {
        for league in sample(rng, pool, quota) {
            let display = league_display(league);
            let text = format!("Had {team} played in {display} as of {year}?");
            let tags = vec![team.clone(), league.clone()];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Had $TEAM won $LEAGUE as of $NUMBER?"
pub fn team_win_league_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $TEAM won $LEAGUE as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let (played, won) = league_history(ctx, team_id)?;
    let never_won: Vec<String> = played.into_iter().filter(|l| !won.contains(l)).collect();
    let won: Vec<String> = won.into_iter().collect();

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [(&won, positive_count, true), (&never_won, negative_count, false)]
    {
        for league in sample(rng, pool, quota) {
            let display = league_display(league);
            let text = format!("Had {team} won {display} as of {year}?");
            let tags = vec![team.clone(), league.clone()];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Had $TEAM never won $LEAGUE as of $NUMBER?"
pub fn team_never_win_league_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $TEAM never won $LEAGUE as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let (played, won) = league_history(ctx, team_id)?;
    let never_won: Vec<String> = played.into_iter().filter(|l| !won.contains(l)).collect();
    let won: Vec<String> = won.into_iter().collect();

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in
        [(&never_won, positive_count, true), (&won, negative_count, false)]
    {
        for league in sample(rng, pool, quota) {
            let display = league_display(league);
            let text = format!("Had {team} never won {display} as of {year}?");
            let tags = vec![team.clone(), league.clone()];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER win $LEAGUE with $TEAM?"
pub fn player_win_league_with_team<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER win $LEAGUE with $TEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let (winners, others) = title_pools(ctx, team_id, None)?;

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [(&winners, positive_count, true), (&others, negative_count, false)]
    {
        for (app, league) in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let display = league_display(league);
            let text = format!("Did {player} win {display} with {team}?");
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

/// "Had $PLAYER won $LEAGUE with $TEAM as of $NUMBER?"
pub fn player_win_league_with_team_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $PLAYER won $LEAGUE with $TEAM as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let (winners, others) = title_pools(ctx, team_id, Some(year))?;

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [(&winners, positive_count, true), (&others, negative_count, false)]
    {
        for (app, league) in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let display = league_display(league);
            let text = format!("Had {player} won {display} with {team} as of {year}?");
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

/// Leagues the team appeared in and leagues it won, inside its window.
fn league_history(
    ctx: &GenContext<'_>,
    team_id: i64,
) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
    let standings = ctx.facts.standings_for_team(team_id)?;
    let mut played = BTreeSet::new();
    let mut won = BTreeSet::new();
    for line in standings {
        if !ctx.cutoffs.contains_season(team_id, &line.season) {
            continue;
        }
        if line.champion {
            won.insert(line.league.clone());
        }
        played.insert(line.league);
    }
    Ok((played, won))
}

/// Per (player, league): whether any of the player's seasons for the team
/// was a title-winning one. An optional year cap restricts both sides for
/// the "as of" variant.
#[allow(clippy::type_complexity)]
fn title_pools(
    ctx: &GenContext<'_>,
    team_id: i64,
    year_cap: Option<i32>,
) -> Result<(Vec<(Appearance, String)>, Vec<(Appearance, String)>)> {
    let in_cap = |season: &str| match year_cap {
        Some(cap) => season_first_year(season).is_some_and(|y| y <= cap),
        None => true,
    };

    let champion_seasons: BTreeSet<(String, String)> = ctx
        .facts
        .standings_for_team(team_id)?
        .into_iter()
        .filter(|s| s.champion)
        .filter(|s| ctx.cutoffs.contains_season(team_id, &s.season))
        .filter(|s| in_cap(&s.season))
        .map(|s| (s.league, s.season))
        .collect();

    let apps = eligible_for_team(ctx, team_id)?;
    let mut by_player_league: BTreeMap<(i64, String), (Appearance, bool)> = BTreeMap::new();
    for app in apps {
        if !in_cap(&app.season) {
            continue;
        }
        let won = champion_seasons.contains(&(app.league.clone(), app.season.clone()));
        let entry = by_player_league
            .entry((app.player_id, app.league.clone()))
            .or_insert((app, false));
        entry.1 |= won;
    }

    let mut winners = Vec::new();
    let mut others = Vec::new();
    for ((_, league), (app, won)) in by_player_league {
        if won {
            winners.push((app, league));
        } else {
            others.push((app, league));
        }
    }
    Ok((winners, others))
}
