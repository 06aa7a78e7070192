//! Request handling: tops up the reserve when the history cannot cover the
//! requested card count, then publishes the batch.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::cutoffs::CutOffs;
use crate::facts::FactRepository;
use crate::history::HistoryStore;
use crate::orchestrator::run_generation;
use crate::publish::{publish_questions, resolve_tag_records, set_parent_tag, RecordStore};
use crate::question::StoredQuestion;

/// Each quota is generated with this much headroom so that dedup and sparse
/// sub-universes still leave enough fresh questions.
pub const OVERGENERATION_FACTOR: usize = 3;

/// An incoming request for a batch of cards about one team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    pub parent_tag_record_id: String,
    /// Team id in the statistics store, transported as a string.
    pub parent_tag_team_id: String,
    pub cards_required: usize,
    pub base_id: String,
    pub table_id: String,
    pub tags_table_id: String,
}

impl CardRequest {
    pub fn team_id(&self) -> Result<i64> {
        self.parent_tag_team_id
            .parse()
            .with_context(|| format!("bad team id '{}'", self.parent_tag_team_id))
    }
}

/// Serves one request. Unused history entries for the topic are spent first;
/// any deficit is covered by a fresh over-generated batch, deduplicated
/// against the full history. Returns the number of cards delivered to the
/// record store.
pub fn handle_request<R: Rng + ?Sized, S: RecordStore>(
    request: &CardRequest,
    facts: &FactRepository,
    history: &HistoryStore,
    store: &mut S,
    rng: &mut R,
    cutoffs: &CutOffs,
) -> Result<usize> {
    let team_id = request.team_id()?;
    history.ensure_schema()?;

    let existing = history.unused_for_parent_tag(&request.parent_tag_record_id)?;
    let requested = request.cards_required;
    log::info!(
        "requested {} cards for parent tag {}, {} held in reserve",
        requested,
        request.parent_tag_record_id,
        existing.len()
    );

    let output = if requested > existing.len() {
        let deficit = requested - existing.len();
        let mut generated = run_generation(
            facts,
            rng,
            team_id,
            deficit * OVERGENERATION_FACTOR,
            cutoffs,
        )?;
        resolve_tag_records(store, &request.tags_table_id, &mut generated)?;
        set_parent_tag(&mut generated, &request.parent_tag_record_id);

        let candidates: Vec<StoredQuestion> = generated
            .iter()
            .map(|(text, question)| StoredQuestion::from_question(text, question))
            .collect();
        let mut fresh = history.exclude_duplicates(candidates)?;
        log::info!("{} fresh questions after dedup", fresh.len());

        fresh.shuffle(rng);
        let reserve = fresh.split_off(deficit.min(fresh.len()));
        history.store(&fresh, &reserve)?;
        history.mark_used(&existing)?;

        let mut output = existing;
        output.extend(fresh);
        output
    } else {
        let output: Vec<StoredQuestion> = existing.into_iter().take(requested).collect();
        history.mark_used(&output)?;
        output
    };

    let sent = publish_questions(store, &request.table_id, &output)?;
    log::info!("published {sent} of {} cards", output.len());
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_from_camel_case() {
        let request: CardRequest = serde_json::from_str(
            r#"{
                "parentTagRecordId": "recP",
                "parentTagTeamId": "52",
                "cardsRequired": 10,
                "baseId": "app1",
                "tableId": "tblCards",
                "tagsTableId": "tblTags"
            }"#,
        )
        .unwrap();
        assert_eq!(request.team_id().unwrap(), 52);
        assert_eq!(request.cards_required, 10);
        assert_eq!(request.tags_table_id, "tblTags");
    }

    #[test]
    fn test_non_numeric_team_id_is_an_error() {
        let request = CardRequest {
            parent_tag_record_id: "recP".to_string(),
            parent_tag_team_id: "team-52".to_string(),
            cards_required: 1,
            base_id: "app1".to_string(),
            table_id: "tbl".to_string(),
            tags_table_id: "tags".to_string(),
        };
        assert!(request.team_id().is_err());
    }
}
