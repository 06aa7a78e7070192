//! Question history: global text-based deduplication and insert-only
//! persistence of generated cards.
//!
//! The rendered question text is the identity key. The duplicate check in
//! [`HistoryStore::exclude_duplicates`] is the only duplicate-prevention
//! mechanism; `store` always inserts and never upserts.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, Result};

use crate::question::StoredQuestion;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<HistoryStore> {
        Ok(HistoryStore {
            conn: Connection::open(path)?,
        })
    }

    pub fn from_connection(conn: Connection) -> HistoryStore {
        HistoryStore { conn }
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS templates (
                question TEXT NOT NULL,
                tags TEXT NOT NULL,
                parent_tags TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                template TEXT NOT NULL,
                answer INTEGER NOT NULL,
                insert_time TEXT NOT NULL,
                in_use INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Questions held in reserve for the given parent tag.
    pub fn unused_for_parent_tag(&self, parent_tag_record_id: &str) -> Result<Vec<StoredQuestion>> {
        let mut stmt = self.conn.prepare(
            "SELECT question, tags, parent_tags, difficulty, template, answer, \
             insert_time, in_use \
             FROM templates WHERE in_use = 0 AND parent_tags LIKE ?1",
        )?;
        let pattern = format!("%{parent_tag_record_id}%");
        let rows = stmt.query_map(params![pattern], map_stored)?;
        rows.collect()
    }

    /// Every question text ever stored, regardless of topic or use state.
    pub fn all_question_texts(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT question FROM templates")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    /// Drops candidates whose text already exists anywhere in the history.
    pub fn exclude_duplicates(
        &self,
        candidates: Vec<StoredQuestion>,
    ) -> Result<Vec<StoredQuestion>> {
        let existing = self.all_question_texts()?;
        Ok(candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.question))
            .collect())
    }

    /// Inserts both groups as new rows, stamping a fresh UTC insert time and
    /// tagging `in_use` accordingly.
    pub fn store(&self, used: &[StoredQuestion], not_used: &[StoredQuestion]) -> Result<()> {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        for (group, in_use) in [(used, true), (not_used, false)] {
            for entry in group {
                self.conn.execute(
                    "INSERT INTO templates (question, tags, parent_tags, difficulty, \
                     template, answer, insert_time, in_use) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        entry.question,
                        entry.tags,
                        entry.parent_tags,
                        entry.difficulty,
                        entry.template,
                        entry.answer as i64,
                        timestamp,
                        in_use as i64,
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// Flags questions as consumed and re-stamps their insert time.
    pub fn mark_used(&self, questions: &[StoredQuestion]) -> Result<()> {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        for entry in questions {
            self.conn.execute(
                "UPDATE templates SET in_use = 1, insert_time = ?1 WHERE question = ?2",
                params![timestamp, entry.question],
            )?;
        }
        Ok(())
    }
}

fn map_stored(row: &rusqlite::Row<'_>) -> Result<StoredQuestion> {
    Ok(StoredQuestion {
        question: row.get(0)?,
        tags: row.get(1)?,
        parent_tags: row.get(2)?,
        difficulty: row.get(3)?,
        template: row.get(4)?,
        answer: row.get::<_, i64>(5)? != 0,
        insert_time: row.get(6)?,
        in_use: row.get::<_, i64>(7)? != 0,
    })
}
