//! Read-only fact queries against the statistics database.
//!
//! The statistics store is an external, pre-aggregated SQLite schema:
//! `players`, `teams`, `leagues`, `appearances`, `transfers`, `fixtures`
//! and `standings`. This adapter exposes the typed row shapes the
//! generators consume and nothing else.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Result, Row};

/// One player-team-season line from the statistics store.
#[derive(Debug, Clone)]
pub struct Appearance {
    pub player_id: i64,
    pub player_name: String,
    pub birth_date: Option<NaiveDate>,
    pub team_id: i64,
    pub team_name: String,
    pub league: String,
    pub season: String,
    pub position: String,
    pub shirt_number: Option<i64>,
    pub goals: i64,
    pub matches: i64,
}

/// A transfer between two named teams in a calendar year.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub player_name: String,
    pub birth_date: Option<NaiveDate>,
    pub from_team: String,
    pub to_team: String,
    pub year: i32,
}

/// A finished match with its venue and final score.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub season: String,
    pub stadium: String,
    pub home_goals: i64,
    pub away_goals: i64,
}

/// One team-league-season standing line.
#[derive(Debug, Clone)]
pub struct Standing {
    pub team_name: String,
    pub league: String,
    pub season: String,
    pub champion: bool,
}

pub struct FactRepository {
    conn: Connection,
}

const APPEARANCE_SELECT: &str = "SELECT a.player_id, p.name, p.birth_date, a.team_id, t.name, \
     l.name, a.season, a.position, a.shirt_number, a.goals, a.matches \
     FROM appearances a \
     JOIN players p ON p.player_id = a.player_id \
     JOIN teams t ON t.team_id = a.team_id \
     JOIN leagues l ON l.league_id = a.league_id";

impl FactRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FactRepository> {
        Ok(FactRepository {
            conn: Connection::open(path)?,
        })
    }

    pub fn from_connection(conn: Connection) -> FactRepository {
        FactRepository { conn }
    }

    pub fn team_name(&self, team_id: i64) -> Result<String> {
        self.conn.query_row(
            "SELECT name FROM teams WHERE team_id = ?1",
            params![team_id],
            |row| row.get(0),
        )
    }

    /// Every appearance line recorded for the team.
    pub fn appearances_for_team(&self, team_id: i64) -> Result<Vec<Appearance>> {
        let sql = format!("{APPEARANCE_SELECT} WHERE a.team_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![team_id], map_appearance)?;
        rows.collect()
    }

    /// Appearance lines of players who never appeared for the team. These
    /// players make up the negative sub-universe for membership questions.
    pub fn appearances_outside_team(&self, team_id: i64) -> Result<Vec<Appearance>> {
        let sql = format!(
            "{APPEARANCE_SELECT} WHERE a.player_id NOT IN \
             (SELECT player_id FROM appearances WHERE team_id = ?1)"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![team_id], map_appearance)?;
        rows.collect()
    }

    /// Transfers where the named team is either side of the move.
    pub fn transfers_involving(&self, team_name: &str) -> Result<Vec<Transfer>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.name, p.birth_date, tr.from_team, tr.to_team, tr.year \
             FROM transfers tr \
             JOIN players p ON p.player_id = tr.player_id \
             WHERE tr.from_team = ?1 OR tr.to_team = ?1",
        )?;
        let rows = stmt.query_map(params![team_name], |row| {
            Ok(Transfer {
                player_name: row.get(0)?,
                birth_date: row.get(1)?,
                from_team: row.get(2)?,
                to_team: row.get(3)?,
                year: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    /// Finished matches the team played, home or away.
    pub fn fixtures_for_team(&self, team_id: i64) -> Result<Vec<Fixture>> {
        let mut stmt = self.conn.prepare(
            "SELECT home.name, away.name, l.name, f.season, f.stadium, \
             f.home_goals, f.away_goals \
             FROM fixtures f \
             JOIN teams home ON home.team_id = f.home_team_id \
             JOIN teams away ON away.team_id = f.away_team_id \
             JOIN leagues l ON l.league_id = f.league_id \
             WHERE f.home_team_id = ?1 OR f.away_team_id = ?1",
        )?;
        let rows = stmt.query_map(params![team_id], |row| {
            Ok(Fixture {
                home_team: row.get(0)?,
                away_team: row.get(1)?,
                league: row.get(2)?,
                season: row.get(3)?,
                stadium: row.get(4)?,
                home_goals: row.get(5)?,
                away_goals: row.get(6)?,
            })
        })?;
        rows.collect()
    }

    /// League standings lines for the team across seasons.
    pub fn standings_for_team(&self, team_id: i64) -> Result<Vec<Standing>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, l.name, s.season, s.is_champion \
             FROM standings s \
             JOIN teams t ON t.team_id = s.team_id \
             JOIN leagues l ON l.league_id = s.league_id \
             WHERE s.team_id = ?1",
        )?;
        let rows = stmt.query_map(params![team_id], |row| {
            Ok(Standing {
                team_name: row.get(0)?,
                league: row.get(1)?,
                season: row.get(2)?,
                champion: row.get::<_, i64>(3)? != 0,
            })
        })?;
        rows.collect()
    }

    pub fn league_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM leagues")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    /// Team name -> canonical abbreviation, skipping blank abbreviations.
    pub fn team_abbreviations(&self) -> Result<HashMap<String, String>> {
        self.abbreviations("SELECT name, abbreviation FROM teams")
    }

    /// League name -> canonical abbreviation, skipping blank abbreviations.
    pub fn league_abbreviations(&self) -> Result<HashMap<String, String>> {
        self.abbreviations("SELECT name, abbreviation FROM leagues")
    }

    fn abbreviations(&self, sql: &str) -> Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut out = HashMap::new();
        for row in rows {
            let (name, abbr) = row?;
            if let Some(abbr) = abbr {
                if !abbr.trim().is_empty() {
                    out.insert(name, abbr);
                }
            }
        }
        Ok(out)
    }
}

fn map_appearance(row: &Row<'_>) -> Result<Appearance> {
    Ok(Appearance {
        player_id: row.get(0)?,
        player_name: row.get(1)?,
        birth_date: row.get(2)?,
        team_id: row.get(3)?,
        team_name: row.get(4)?,
        league: row.get(5)?,
        season: row.get(6)?,
        position: row.get(7)?,
        shirt_number: row.get(8)?,
        goals: row.get(9)?,
        matches: row.get(10)?,
    })
}
