//! Shirt-number patterns. False instances bump the real number by a small
//! random offset so the wrong answer stays plausible.

use anyhow::Result;
use rand::Rng;

use crate::question::QuestionMap;
use crate::util::{format_player_tag, preprocess_player_name, resolve_counts, shorten_season};

use super::{as_of_year, eligible_for_team, push_question, sample, GenContext};

/// "Did $PLAYER wear the number $SNUMBER shirt for $TEAM in the $SEASON season?"
pub fn player_wore_shirt_for_team_at_season<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str =
        "Did $PLAYER wear the number $SNUMBER shirt for $TEAM in the $SEASON season?";
    let team = ctx.facts.team_name(team_id)?;
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let with_shirt: Vec<_> = inside
        .into_iter()
        .filter(|a| a.shirt_number.is_some())
        .collect();

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for app in sample(rng, &with_shirt, quota) {
            let actual = app.shirt_number.unwrap_or_default();
            let number = if truthful {
                actual
            } else {
                bump_number(rng, actual)
            };
            let player = preprocess_player_name(&app.player_name);
            let season = shorten_season(&app.season);
            let text = format!(
                "Did {player} wear the number {number} shirt for {team} in the {season} season?"
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

/// "Had $PLAYER worn the number $SNUMBER shirt for $TEAM as of $NUMBER?"
pub fn player_wore_shirt_for_team_as_of_limiter<R: Rng + ?Sized>(
    ctx: &GenContext<'_>,
    rng: &mut R,
    team_id: i64,
    count: usize,
) -> Result<QuestionMap> {
    const TEMPLATE: &str =
        "Had $PLAYER worn the number $SNUMBER shirt for $TEAM as of $NUMBER?";
    let team = ctx.facts.team_name(team_id)?;
    let year = as_of_year(ctx, team_id);
    let (positive_count, negative_count) = resolve_counts(count);
    let inside = eligible_for_team(ctx, team_id)?;
    let with_shirt: Vec<_> = inside
        .into_iter()
        .filter(|a| a.shirt_number.is_some())
        .collect();

    let mut questions = QuestionMap::new();
    for (quota, truthful) in [(positive_count, true), (negative_count, false)] {
        for app in sample(rng, &with_shirt, quota) {
            let actual = app.shirt_number.unwrap_or_default();
            let number = if truthful {
                actual
            } else {
                bump_number(rng, actual)
            };
            let player = preprocess_player_name(&app.player_name);
            let text = format!(
                "Had {player} worn the number {number} shirt for {team} as of {year}?"
            );
            let tags = vec![
                team.clone(),
                format_player_tag(&app.player_name, app.birth_date),
            ];
            push_question(&mut questions, text, TEMPLATE, None, tags, &team, truthful);
        }
    }
    Ok(questions)
}

/// A nearby but wrong shirt number, always positive and never the original.
fn bump_number<R: Rng + ?Sized>(rng: &mut R, actual: i64) -> i64 {
    let offset = rng.gen_range(1..=7);
    if actual > offset {
        actual - offset
    } else {
        actual + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bump_number_never_returns_actual() {
        let mut rng = StdRng::seed_from_u64(7);
        for actual in 1..=40 {
            for _ in 0..20 {
                let bumped = bump_number(&mut rng, actual);
                assert_ne!(bumped, actual);
                assert!(bumped >= 1);
            }
        }
    }
}
