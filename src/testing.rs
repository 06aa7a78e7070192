//! Test support: an in-memory record store with scripted failures and
//! builders for throwaway statistics databases.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Result};
use serde_json::json;

use crate::publish::{Fields, Record, RecordStore, RecordStoreError};

/// In-memory [`RecordStore`] that can be primed to fail the next N create
/// calls, for exercising the retry path.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: BTreeMap<String, Vec<Record>>,
    next_id: usize,
    transient_failures: usize,
    fatal_failures: usize,
}

impl MemoryRecordStore {
    pub fn new() -> MemoryRecordStore {
        MemoryRecordStore::default()
    }

    /// The next `count` create calls fail with a transient error.
    pub fn fail_transiently(&mut self, count: usize) {
        self.transient_failures = count;
    }

    /// The next create call fails with a fatal error.
    pub fn fail_fatally_once(&mut self) {
        self.fatal_failures = 1;
    }

    /// Plants a canonical tag record without consuming scripted failures.
    pub fn seed_tag(&mut self, table_id: &str, tag: &str, record_id: &str) {
        let mut fields = Fields::new();
        fields.insert("Tag".to_string(), json!(tag));
        fields.insert("Record_ID".to_string(), json!(record_id));
        self.tables
            .entry(table_id.to_string())
            .or_default()
            .push(Record { fields });
    }

    pub fn records(&self, table_id: &str) -> Vec<Record> {
        self.tables.get(table_id).cloned().unwrap_or_default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn iterate_records(&mut self, table_id: &str) -> Result<Vec<Record>, RecordStoreError> {
        Ok(self.records(table_id))
    }

    fn create_record(
        &mut self,
        table_id: &str,
        mut fields: Fields,
    ) -> Result<Record, RecordStoreError> {
        if self.transient_failures > 0 {
            self.transient_failures -= 1;
            return Err(RecordStoreError::Transient("scripted failure".to_string()));
        }
        if self.fatal_failures > 0 {
            self.fatal_failures -= 1;
            return Err(RecordStoreError::Fatal("scripted failure".to_string()));
        }
        self.next_id += 1;
        if !fields.contains_key("Record_ID") {
            fields.insert("Record_ID".to_string(), json!(format!("rec_mem_{}", self.next_id)));
        }
        let record = Record { fields };
        self.tables
            .entry(table_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }
}

/// Empty in-memory statistics database with the full external schema.
pub fn stats_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(
        "CREATE TABLE players (
            player_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            birth_date TEXT
        );
        CREATE TABLE teams (
            team_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            stadium TEXT,
            abbreviation TEXT
        );
        CREATE TABLE leagues (
            league_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            abbreviation TEXT
        );
        CREATE TABLE appearances (
            player_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            league_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            position TEXT NOT NULL,
            shirt_number INTEGER,
            goals INTEGER NOT NULL,
            matches INTEGER NOT NULL
        );
        CREATE TABLE transfers (
            player_id INTEGER NOT NULL,
            from_team TEXT NOT NULL,
            to_team TEXT NOT NULL,
            year INTEGER NOT NULL
        );
        CREATE TABLE fixtures (
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            league_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            stadium TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL
        );
        CREATE TABLE standings (
            team_id INTEGER NOT NULL,
            league_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            is_champion INTEGER NOT NULL
        );",
    )?;
    Ok(conn)
}

pub fn add_player(
    conn: &Connection,
    player_id: i64,
    name: &str,
    birth_date: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO players (player_id, name, birth_date) VALUES (?1, ?2, ?3)",
        params![player_id, name, birth_date],
    )?;
    Ok(())
}

pub fn add_team(
    conn: &Connection,
    team_id: i64,
    name: &str,
    stadium: &str,
    abbreviation: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO teams (team_id, name, stadium, abbreviation) VALUES (?1, ?2, ?3, ?4)",
        params![team_id, name, stadium, abbreviation],
    )?;
    Ok(())
}

pub fn add_league(
    conn: &Connection,
    league_id: i64,
    name: &str,
    abbreviation: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO leagues (league_id, name, abbreviation) VALUES (?1, ?2, ?3)",
        params![league_id, name, abbreviation],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add_appearance(
    conn: &Connection,
    player_id: i64,
    team_id: i64,
    league_id: i64,
    season: &str,
    position: &str,
    shirt_number: Option<i64>,
    goals: i64,
    matches: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO appearances (player_id, team_id, league_id, season, position, \
         shirt_number, goals, matches) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![player_id, team_id, league_id, season, position, shirt_number, goals, matches],
    )?;
    Ok(())
}

pub fn add_transfer(
    conn: &Connection,
    player_id: i64,
    from_team: &str,
    to_team: &str,
    year: i32,
) -> Result<()> {
    conn.execute(
        "INSERT INTO transfers (player_id, from_team, to_team, year) VALUES (?1, ?2, ?3, ?4)",
        params![player_id, from_team, to_team, year],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add_fixture(
    conn: &Connection,
    home_team_id: i64,
    away_team_id: i64,
    league_id: i64,
    season: &str,
    stadium: &str,
    home_goals: i64,
    away_goals: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO fixtures (home_team_id, away_team_id, league_id, season, stadium, \
         home_goals, away_goals) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![home_team_id, away_team_id, league_id, season, stadium, home_goals, away_goals],
    )?;
    Ok(())
}

pub fn add_standing(
    conn: &Connection,
    team_id: i64,
    league_id: i64,
    season: &str,
    champion: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO standings (team_id, league_id, season, is_champion) \
         VALUES (?1, ?2, ?3, ?4)",
        params![team_id, league_id, season, champion as i64],
    )?;
    Ok(())
}
