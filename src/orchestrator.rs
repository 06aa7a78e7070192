//! Runs the full generation pass: splits the requested total across the 27
//! patterns by their fixed weights, invokes each generator in registry
//! order, merges the outputs and canonicalizes tags.

use anyhow::Result;
use rand::Rng;

use crate::cutoffs::CutOffs;
use crate::facts::FactRepository;
use crate::generators::{run_generator, GenContext, GeneratorKind, GENERATOR_WEIGHTS};
use crate::question::QuestionMap;

/// Per-generator quota: weight times total, truncated.
pub fn quota_for(kind: GeneratorKind, total_count: usize) -> usize {
    GENERATOR_WEIGHTS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, weight)| (weight * total_count as f64) as usize)
        .unwrap_or(0)
}

/// Generates up to `total_count` questions for the team. Sparse fact
/// sub-universes make individual generators under-deliver; the caller must
/// tolerate a smaller map.
pub fn run_generation<R: Rng + ?Sized>(
    facts: &FactRepository,
    rng: &mut R,
    team_id: i64,
    total_count: usize,
    cutoffs: &CutOffs,
) -> Result<QuestionMap> {
    let ctx = GenContext { facts, cutoffs };
    let mut questions = QuestionMap::new();
    for (kind, _) in GENERATOR_WEIGHTS {
        let quota = quota_for(kind, total_count);
        log::info!("running {} with quota {}", kind.name(), quota);
        let generated = run_generator(kind, &ctx, rng, team_id, quota)?;
        log::info!("questions generated with this generator: {}", generated.len());
        for (text, question) in generated {
            // Identical texts from two generators point at a templating
            // bug; keep the later one but say so.
            if questions.insert(text.clone(), question).is_some() {
                log::warn!("duplicate question text across generators: {text}");
            }
        }
    }
    post_process_tags(facts, &mut questions)?;
    Ok(questions)
}

/// Replaces team and league tag names with their canonical abbreviations
/// where one exists, and drops tags that are blank after trimming.
fn post_process_tags(facts: &FactRepository, questions: &mut QuestionMap) -> Result<()> {
    let teams = facts.team_abbreviations()?;
    let leagues = facts.league_abbreviations()?;
    for question in questions.values_mut() {
        let mut processed = Vec::with_capacity(question.tags.len());
        for tag in question.tags.drain(..) {
            let tag = teams.get(&tag).cloned().unwrap_or(tag);
            let tag = leagues.get(&tag).cloned().unwrap_or(tag);
            if !tag.trim().is_empty() {
                processed.push(tag);
            }
        }
        question.tags = processed;
    }
    Ok(())
}
