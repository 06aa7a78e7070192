//! Publishing: canonical tag resolution against the external record store
//! and delivery of finished cards, with a bounded immediate-retry loop for
//! transient transport failures.

use std::collections::HashMap;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::question::{Difficulty, QuestionMap, StoredQuestion};
use crate::util::preprocess_tag;

/// Retry ceiling per card; a transient failure past this is dropped.
pub const MAX_PUBLISH_ATTEMPTS: usize = 10;

pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct Record {
    pub fields: Fields,
}

/// Failure classes of the destination store. Transient failures are
/// transport-level and worth retrying; anything else aborts the batch.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("transient record store error: {0}")]
    Transient(String),
    #[error("record store error: {0}")]
    Fatal(String),
}

/// The spreadsheet-like external store holding canonical tag records and
/// receiving published cards.
pub trait RecordStore {
    fn iterate_records(&mut self, table_id: &str) -> Result<Vec<Record>, RecordStoreError>;
    fn create_record(&mut self, table_id: &str, fields: Fields)
        -> Result<Record, RecordStoreError>;
}

/// Overwrites every question's parent tags with the request's parent-tag
/// record id.
pub fn set_parent_tag(questions: &mut QuestionMap, parent_tag_record_id: &str) {
    for question in questions.values_mut() {
        question.parent_tags = vec![parent_tag_record_id.to_string()];
    }
}

/// Swaps tag names for canonical record ids, creating a "Requested" tag
/// record for every name with no canonical entry yet. Lookups are cached
/// for the duration of this pass only.
pub fn resolve_tag_records<S: RecordStore>(
    store: &mut S,
    tags_table_id: &str,
    questions: &mut QuestionMap,
) -> Result<(), RecordStoreError> {
    let mut known = existing_tags(store, tags_table_id)?;
    for question in questions.values_mut() {
        let mut ids: Vec<String> = Vec::new();
        for tag in &question.tags {
            let key = preprocess_tag(tag);
            let id = match known.get(&key) {
                Some(id) => id.clone(),
                None => {
                    let id = create_tag_record(store, tags_table_id, tag)?;
                    known.insert(key, id.clone());
                    id
                }
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        question.tags = ids;
    }
    Ok(())
}

/// Normalized tag name -> record id, from the canonical tag table.
fn existing_tags<S: RecordStore>(
    store: &mut S,
    tags_table_id: &str,
) -> Result<HashMap<String, String>, RecordStoreError> {
    let mut out = HashMap::new();
    for record in store.iterate_records(tags_table_id)? {
        let name = record.fields.get("Tag").and_then(Value::as_str);
        let id = record.fields.get("Record_ID").and_then(Value::as_str);
        if let (Some(name), Some(id)) = (name, id) {
            out.insert(preprocess_tag(name), id.to_string());
        }
    }
    Ok(out)
}

fn create_tag_record<S: RecordStore>(
    store: &mut S,
    tags_table_id: &str,
    tag: &str,
) -> Result<String, RecordStoreError> {
    let mut fields = Fields::new();
    fields.insert("Tag".to_string(), json!(tag));
    fields.insert("Status".to_string(), json!("Requested"));
    let created = store.create_record(tags_table_id, fields)?;
    created
        .fields
        .get("Record_ID")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            RecordStoreError::Fatal(format!("created tag record for '{tag}' has no Record_ID"))
        })
}

/// Pushes finished cards to the destination table. Each card gets up to
/// [`MAX_PUBLISH_ATTEMPTS`] immediate tries on transient failures and is
/// silently dropped afterwards; any other failure aborts the batch.
/// Returns the number of cards delivered.
pub fn publish_questions<S: RecordStore>(
    store: &mut S,
    table_id: &str,
    questions: &[StoredQuestion],
) -> Result<usize, RecordStoreError> {
    let mut sent = 0;
    for question in questions {
        let fields = card_fields(question);
        let mut delivered = false;
        for _ in 0..MAX_PUBLISH_ATTEMPTS {
            match store.create_record(table_id, fields.clone()) {
                Ok(_) => {
                    delivered = true;
                    break;
                }
                Err(RecordStoreError::Transient(_)) => continue,
                Err(fatal) => return Err(fatal),
            }
        }
        if delivered {
            sent += 1;
        } else {
            log::warn!(
                "dropping card after {MAX_PUBLISH_ATTEMPTS} attempts: {}",
                question.question
            );
        }
    }
    Ok(sent)
}

/// Card record in the destination schema.
fn card_fields(question: &StoredQuestion) -> Fields {
    let mut fields = Fields::new();
    fields.insert("Card".to_string(), json!(question.question));
    fields.insert("Tags".to_string(), json!(question.tag_ids()));
    fields.insert("Parent-tag".to_string(), json!(question.parent_tag_ids()));
    fields.insert(
        "Tier".to_string(),
        json!(Difficulty::from_str_lossy(&question.difficulty).capitalized()),
    );
    fields.insert(
        "Answer".to_string(),
        json!(if question.answer { "TRUE" } else { "FALSE" }),
    );
    fields
}

// ---- HTTP implementation ----

#[derive(Deserialize)]
struct RecordsPage {
    records: Vec<ApiRecord>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct ApiRecord {
    #[serde(default)]
    fields: Fields,
}

/// Blocking REST client for the production record store.
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
    base_id: String,
    api_key: String,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, base_id: &str, api_key: &str) -> HttpRecordStore {
        HttpRecordStore {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            base_id: base_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.base_id, table_id)
    }
}

/// Rate limiting and server-side hiccups are worth retrying; anything else
/// indicates a request the store will never accept.
fn classify_status(status: StatusCode, body: String) -> RecordStoreError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        RecordStoreError::Transient(format!("{status}: {body}"))
    } else {
        RecordStoreError::Fatal(format!("{status}: {body}"))
    }
}

impl RecordStore for HttpRecordStore {
    fn iterate_records(&mut self, table_id: &str) -> Result<Vec<Record>, RecordStoreError> {
        let url = self.table_url(table_id);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut request = self.client.get(&url).bearer_auth(&self.api_key);
            if let Some(ref cursor) = offset {
                request = request.query(&[("offset", cursor)]);
            }
            let response = request
                .send()
                .map_err(|e| RecordStoreError::Transient(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(classify_status(status, body));
            }
            let page: RecordsPage = response
                .json()
                .map_err(|e| RecordStoreError::Fatal(e.to_string()))?;
            records.extend(page.records.into_iter().map(|r| Record { fields: r.fields }));
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    fn create_record(
        &mut self,
        table_id: &str,
        fields: Fields,
    ) -> Result<Record, RecordStoreError> {
        let response = self
            .client
            .post(self.table_url(table_id))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .map_err(|e| RecordStoreError::Transient(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status, body));
        }
        let created: ApiRecord = response
            .json()
            .map_err(|e| RecordStoreError::Fatal(e.to_string()))?;
        Ok(Record {
            fields: created.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRecordStore;

    fn card(text: &str) -> StoredQuestion {
        StoredQuestion {
            question: text.to_string(),
            tags: "[\"recT\"]".to_string(),
            parent_tags: "[\"recP\"]".to_string(),
            difficulty: "hard".to_string(),
            template: "t".to_string(),
            answer: false,
            insert_time: String::new(),
            in_use: true,
        }
    }

    #[test]
    fn test_card_fields_shape() {
        let fields = card_fields(&card("Did X play for Y?"));
        assert_eq!(fields["Card"], json!("Did X play for Y?"));
        assert_eq!(fields["Tags"], json!(["recT"]));
        assert_eq!(fields["Parent-tag"], json!(["recP"]));
        assert_eq!(fields["Tier"], json!("Hard"));
        assert_eq!(fields["Answer"], json!("FALSE"));
    }

    #[test]
    fn test_publish_succeeds_on_tenth_attempt() {
        let mut store = MemoryRecordStore::new();
        store.fail_transiently(9);
        let sent = publish_questions(&mut store, "tbl", &[card("q1")]).unwrap();
        assert_eq!(sent, 1);
        assert_eq!(store.records("tbl").len(), 1);
    }

    #[test]
    fn test_publish_drops_card_after_ten_transient_failures() {
        let mut store = MemoryRecordStore::new();
        store.fail_transiently(10);
        let sent = publish_questions(&mut store, "tbl", &[card("q1")]).unwrap();
        assert_eq!(sent, 0);
        assert!(store.records("tbl").is_empty());
    }

    #[test]
    fn test_publish_propagates_fatal_errors() {
        let mut store = MemoryRecordStore::new();
        store.fail_fatally_once();
        let result = publish_questions(&mut store, "tbl", &[card("q1"), card("q2")]);
        assert!(matches!(result, Err(RecordStoreError::Fatal(_))));
    }

    #[test]
    fn test_resolve_tags_reuses_and_creates_records() {
        let mut store = MemoryRecordStore::new();
        store.seed_tag("tags", "Real Madrid", "rec_rma");

        let mut questions = QuestionMap::new();
        questions.insert(
            "q".to_string(),
            crate::question::Question {
                tags: vec![
                    " real madrid ".to_string(),
                    "Atlético Madrid".to_string(),
                    "Real Madrid".to_string(),
                ],
                parent_tags: vec![],
                difficulty: Difficulty::Easy,
                template: "t".to_string(),
                answer: true,
            },
        );
        resolve_tag_records(&mut store, "tags", &mut questions).unwrap();

        let tags = &questions["q"].tags;
        // The pre-seeded tag is reused (normalization folds all three
        // spellings of Real Madrid onto one id) and the unseen tag gets a
        // fresh record.
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&"rec_rma".to_string()));
        let created = store.records("tags");
        assert_eq!(created.len(), 2);
        let requested: Vec<_> = created
            .iter()
            .filter(|r| r.fields.get("Status") == Some(&json!("Requested")))
            .collect();
        assert_eq!(requested.len(), 1);
        assert_eq!(requested[0].fields["Tag"], json!("Atlético Madrid"));
    }
}
