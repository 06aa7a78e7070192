//! Membership patterns: whether a player was ever (or by some year) on the
//! team's books, optionally qualified by position, league and season.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use rand::Rng;

use crate::constants::MAIN_POSITIONS;
use crate::facts::Appearance;
use crate::question::QuestionMap;
use crate::util::{
    format_player_tag, indefinite_article, league_display, preprocess_player_name,
    resolve_counts, resolve_position, season_first_year, shorten_season,
};

use super::{
    as_of_year, dedupe_players, eligible_for_team, eligible_outside_team, push_question, sample,
    since_year, GenContext,
};

/// "Did $PLAYER ever play for $TEAM?"
pub fn player_played_in_team<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER ever play for $TEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let outside = eligible_outside_team(ctx, team_id)?;
    let inside_players = dedupe_players(&inside);
    let outside_players = dedupe_players(&outside);

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [
        (&inside_players, positive_count, true),
        (&outside_players, negative_count, false),
    ] {
        for app in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let text = format!("Did {player} ever play for {team}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER ever play for $TEAM as a $POSITION?"
pub fn player_played_in_team_as_pos<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER ever play for $TEAM as a $POSITION?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let played = positions_by_player(&inside);

    let mut positive: Vec<(&Appearance, String)> = Vec::new();
    let mut negative: Vec<(&Appearance, String)> = Vec::new();
    for (app, positions) in played.values() {
        for pos in positions {
            positive.push((*app, pos.clone()));
        }
        for pos in MAIN_POSITIONS {
            if !positions.contains(pos) {
                negative.push((*app, pos.to_string()));
            }
        }
    }

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [(&positive, positive_count, true), (&negative, negative_count, false)] {
        for (app, pos) in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let article = indefinite_article(pos);
            let text = format!("Did {player} ever play for {team} as {article} {pos}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER play as a $POSITION for $TEAM in $LEAGUE in the $SEASON season?"
pub fn player_played_in_team_as_pos_at_league_season<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str =
        "Did $PLAYER play as a $POSITION for $TEAM in $LEAGUE in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for app in sample(rng, &inside, quota) {
            let actual = resolve_position(&app.position);
            let pos = if truthful {
                actual
            } else {
                match wrong_position(rng, &actual) {
                    Some(p) => p,
                    None => continue,
                }
            };
            let player = preprocess_player_name(&app.player_name);
            let article = indefinite_article(&pos);
            let league = league_display(&app.league);
            let season = shorten_season(&app.season);
            let text = format!(
                "Did {player} play as {article} {pos} for {team} in {league} in the {season} season?"
            );
            let tags = vec![
                team.clone(),
                app.league.clone(),
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

/// "Had $PLAYER never played for $TEAM as of $NUMBER?"
pub fn player_never_played_in_team_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Had $PLAYER never played for $TEAM as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let outside = eligible_outside_team(ctx, team_id)?;
    // The true sub-universe is the players who really never turned out
    // for the team.
    let never_played = dedupe_players(&outside);
    let did_play = dedupe_players(&inside);

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [
        (&never_played, positive_count, true),
        (&did_play, negative_count, false),
    ] {
        for app in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let text = format!("Had {player} never played for {team} as of {year}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Was $PLAYER a $TEAM player at any point since $NUMBER?"
pub fn player_played_in_team_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Was $PLAYER a $TEAM player at any point since $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = since_year(ctx, rng, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let outside = eligible_outside_team(ctx, team_id)?;

    let recent: Vec<Appearance> = inside
        .iter()
        .filter(|a| season_first_year(&a.season).is_some_and(|y| y >= year))
        .cloned()
        .collect();
    let recent_players = dedupe_players(&recent);
    let outside_players = dedupe_players(&outside);

    let article = indefinite_article(&team);
    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in [
        (&recent_players, positive_count, true),
        (&outside_players, negative_count, false),
    ] {
        for app in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let text =
                format!("Was {player} {article} {team} player at any point since {year}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// "Was $PLAYER a former $TEAM player as of $NUMBER?"
pub fn former_team_player_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Was $PLAYER a former $TEAM player as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;

    // Last season each player turned out for the team decides whether they
    // were "former" by the reference year.
    let mut last_seen: BTreeMap<i64, (&Appearance, i32)> = BTreeMap::new();
    for app in &inside {
        if let Some(y) = season_first_year(&app.season) {
            let entry = last_seen.entry(app.player_id).or_insert((app, y));
            if y > entry.1 {
                *entry = (app, y);
            }
        }
    }
    let mut former: Vec<&Appearance> = Vec::new();
    let mut current: Vec<&Appearance> = Vec::new();
    for (app, last) in last_seen.values() {
        if *last < year {
            former.push(*app);
        } else {
            current.push(*app);
        }
    }

    let mut questions = QuestionMap::new();
    for (pool, quota, answer) in
        [(&former, positive_count, true), (&current, negative_count, false)]
    {
        for app in sample(rng, pool, quota) {
            let player = preprocess_player_name(&app.player_name);
            let text = format!("Was {player} a former {team} player as of {year}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, answer);
        }
    }
    Ok(questions)
}

/// Main positions each player actually covered, with a representative row.
fn positions_by_player(apps: &[Appearance]) -> BTreeMap<i64, (&Appearance, BTreeSet<String>)> {
    let mut out: BTreeMap<i64, (&Appearance, BTreeSet<String>)> = BTreeMap::new();
    for app in apps {
        let entry = out
            .entry(app.player_id)
            .or_insert_with(|| (app, BTreeSet::new()));
        entry.1.insert(resolve_position(&app.position));
    }
    out
}

/// A main position different from the one actually played, if any.
fn wrong_position<R: Rng + ?Sized>(rng: &mut R, actual: &str) -> Option<String> {
    let alternatives: Vec<&str> = MAIN_POSITIONS
        .iter()
        .copied()
        .filter(|p| *p != actual)
        .collect();
    sample(rng, &alternatives, 1)
        .first()
        .map(|p| p.to_string())
}
