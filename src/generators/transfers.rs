//! Transfer patterns. Rows pointing at "retired", "without club" or
//! "unknown" carry no usable team linkage and are dropped up front.

use std::collections::BTreeSet;

use anyhow::Result;
use rand::Rng;

use crate::constants::TRANSFER_INVALID_TEAMS;
use crate::facts::Transfer;
use crate::question::QuestionMap;
use crate::util::{format_player_tag, preprocess_player_name, resolve_counts};

use super::{push_question, sample, GenContext};

/// "Did $PLAYER move to $TOTEAM from $FROMTEAM?"
pub fn player_moved_to_team_from_team<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str = "Did $PLAYER move to $TOTEAM from $FROMTEAM?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let pool = valid_transfers(ctx, team_id, &team)?;

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for transfer in sample(rng, &pool, quota) {
            let from_team = if truthful {
                transfer.from_team.clone()
            } else {
                // Pair the move with a source club the player never left.
                match scrambled_source(rng, &pool, transfer) {
                    Some(from) => from,
                    None => continue,
                }
            };
            let player = preprocess_player_name(&transfer.player_name);
            let to_team = &transfer.to_team;
            let text = format!("Did {player} move to {to_team} from {from_team}?");
            let tags = vec![
                transfer.to_team.clone(),
                from_team.clone(),
                format_player_tag(&transfer.player_name, transfer.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, truthful);
        }
    }
    Ok(questions)
}

/// "Did $PLAYER join $TEAM in $NUMBER?" / "Did $PLAYER leave $TEAM in $NUMBER?"
pub fn player_joined_or_left_team_in_year<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const JOIN_TEMPLATE: &str = "Did $PLAYER join $TEAM in $NUMBER?";
    const LEAVE_TEMPLATE: &str = "Did $PLAYER leave $TEAM in $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let pool = valid_transfers(ctx, team_id, &team)?;

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for transfer in sample(rng, &pool, quota) {
            let joined = transfer.to_team == team;
            let year = if truthful {
                transfer.year
            } else {
                // Loan spells and returns give a player several real join
                // or leave years with the same club.
                let real_years: BTreeSet<i32> = pool
                    .iter()
                    .filter(|t| {
                        t.player_name == transfer.player_name && (t.to_team == team) == joined
                    })
                    .map(|t| t.year)
                    .collect();
                match shift_year(rng, transfer.year, &real_years) {
                    Some(y) => y,
                    None => continue,
                }
            };
            let player = preprocess_player_name(&transfer.player_name);
            let (verb, template) = if joined {
                ("join", JOIN_TEMPLATE)
            } else {
                ("leave", LEAVE_TEMPLATE)
            };
            let text = format!("Did {player} {verb} {team} in {year}?");
            let tags = vec![
                team.clone(),
                format_player_tag(&transfer.player_name, transfer.birth_date),
            ];
            push_question(&mut questions, text, template, None, tags, &team, truthful);
        }
    }
    Ok(questions)
}

/// Transfers involving the team with valid clubs on both sides and a year
/// inside the team's window.
fn valid_transfers(
    ctx: &GenContext<'_>,
    team_id: i64,
    team_name: &str,
) -> Result<Vec<Transfer>> {
    let transfers = ctx.facts.transfers_involving(team_name)?;
    Ok(transfers
        .into_iter()
        .filter(|t| is_valid_team(&t.from_team) && is_valid_team(&t.to_team))
        .filter(|t| ctx.cutoffs.contains_year(team_id, t.year))
        .collect())
}

fn is_valid_team(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    !lowered.is_empty() && !TRANSFER_INVALID_TEAMS.contains(&lowered.as_str())
}

/// A source club drawn from another transfer. Players re-sign for the same
/// destination, so every club the player really arrived from is excluded,
/// not just the one on this row.
fn scrambled_source<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[Transfer],
    actual: &Transfer,
) -> Option<String> {
    let real_sources: BTreeSet<&str> = pool
        .iter()
        .filter(|t| t.player_name == actual.player_name && t.to_team == actual.to_team)
        .map(|t| t.from_team.as_str())
        .collect();
    let candidates: Vec<&str> = pool
        .iter()
        .map(|t| t.from_team.as_str())
        .filter(|from| !real_sources.contains(from) && *from != actual.to_team)
        .collect();
    sample(rng, &candidates, 1).first().map(|s| s.to_string())
}

/// A plausible but wrong calendar year, avoiding every year the move really
/// happened in. Gives up when the nearby years are all taken.
fn shift_year<R: Rng + ?Sized>(
    rng: &mut R,
    actual: i32,
    real_years: &BTreeSet<i32>,
) -> Option<i32> {
    for _ in 0..8 {
        let offset = rng.gen_range(1..=3);
        let year = if rng.gen_bool(0.5) {
            actual + offset
        } else {
            actual - offset
        };
        if year != actual && !real_years.contains(&year) {
            return Some(year);
        }
    }
    None
}
