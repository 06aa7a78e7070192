//! The central card entities: in-memory questions keyed by their rendered
//! text, and the flattened row shape used by the history store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Difficulty tier of a generated card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Canonical-cased label for the publishing target ("Easy" etc.).
    pub fn capitalized(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str_lossy(s: &str) -> Difficulty {
        match s {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// One generated question. The rendered question text is not stored here: it
/// is the map key, and it is the question's identity for deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub tags: Vec<String>,
    pub parent_tags: Vec<String>,
    pub difficulty: Difficulty,
    /// Synonym-normalized template the text was rendered from.
    pub template: String,
    pub answer: bool,
}

/// Questions keyed by rendered text. A BTreeMap keeps merge order and
/// "first N" selection deterministic.
pub type QuestionMap = BTreeMap<String, Question>;

/// A question as persisted in the history store. `tags` and `parent_tags`
/// hold JSON-encoded arrays of record ids.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuestion {
    pub question: String,
    pub tags: String,
    pub parent_tags: String,
    pub difficulty: String,
    pub template: String,
    pub answer: bool,
    pub insert_time: String,
    pub in_use: bool,
}

impl StoredQuestion {
    /// Flattens an in-memory question for insertion. Timestamps are stamped
    /// by the history store at write time.
    pub fn from_question(text: &str, question: &Question) -> StoredQuestion {
        StoredQuestion {
            question: text.to_string(),
            tags: serde_json::to_string(&question.tags).unwrap_or_else(|_| "[]".to_string()),
            parent_tags: serde_json::to_string(&question.parent_tags)
                .unwrap_or_else(|_| "[]".to_string()),
            difficulty: question.difficulty.as_str().to_string(),
            template: question.template.clone(),
            answer: question.answer,
            insert_time: String::new(),
            in_use: false,
        }
    }

    pub fn tag_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }

    pub fn parent_tag_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.parent_tags).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_labels() {
        assert_eq!(Difficulty::Easy.as_str(), "easy");
        assert_eq!(Difficulty::Hard.capitalized(), "Hard");
        assert_eq!(Difficulty::from_str_lossy("easy"), Difficulty::Easy);
        assert_eq!(Difficulty::from_str_lossy("nonsense"), Difficulty::Medium);
    }

    #[test]
    fn test_flatten_round_trips_tag_ids() {
        let q = Question {
            tags: vec!["recA".to_string(), "recB".to_string()],
            parent_tags: vec!["recP".to_string()],
            difficulty: Difficulty::Medium,
            template: "Did $PLAYER ever play for $TEAM?".to_string(),
            answer: true,
        };
        let stored = StoredQuestion::from_question("Did X ever play for Y?", &q);
        assert_eq!(stored.tag_ids(), vec!["recA", "recB"]);
        assert_eq!(stored.parent_tag_ids(), vec!["recP"]);
        assert_eq!(stored.difficulty, "medium");
        assert!(stored.answer);
        assert!(!stored.in_use);
    }
}
