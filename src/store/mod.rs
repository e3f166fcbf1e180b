//! SQLite persistence for questions, vote tallies, per-attendee votes,
//! team scores, and display settings.
//!
//! Every mutating operation runs inside its own transaction so a concurrent
//! reader never sees a half-applied change. Operations on unknown question
//! ids affect zero rows instead of failing.

mod question;
mod score;
mod snapshot;
mod vote;

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::StoreResult;

/// Key of the blur flag in `display_setting`
const SCORES_BLURRED_KEY: &str = "scores_blurred";

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at `path` and make sure the schema and
    /// the fixed rows exist. `":memory:"` gives an ephemeral store.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS questions (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                text      TEXT NOT NULL,
                author    TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                is_past   INTEGER NOT NULL DEFAULT 0,
                winner    TEXT CHECK (winner IN ('team_a', 'team_b'))
            );

            CREATE TABLE IF NOT EXISTS vote_tally (
                question_id INTEGER NOT NULL REFERENCES questions(id),
                team        TEXT NOT NULL CHECK (team IN ('team_a', 'team_b')),
                count       INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
                PRIMARY KEY (question_id, team)
            );

            CREATE TABLE IF NOT EXISTS individual_vote (
                question_id INTEGER NOT NULL REFERENCES questions(id),
                attendee_id TEXT NOT NULL,
                team        TEXT NOT NULL CHECK (team IN ('team_a', 'team_b')),
                timestamp   TEXT NOT NULL,
                PRIMARY KEY (question_id, attendee_id)
            );

            CREATE TABLE IF NOT EXISTS team_score (
                team  TEXT PRIMARY KEY CHECK (team IN ('team_a', 'team_b')),
                score INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0)
            );

            CREATE TABLE IF NOT EXISTS display_setting (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            INSERT OR IGNORE INTO team_score (team, score)
                VALUES ('team_a', 0), ('team_b', 0);

            INSERT OR IGNORE INTO display_setting (key, value)
                VALUES ('scores_blurred', 'false');
            ",
        )?;

        tracing::debug!("Opened store at {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection. A poisoned lock is recovered: any transaction
    /// the panicking thread held was rolled back when it was dropped.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Toggle the display's score blur and return the new value
    pub fn toggle_scores_blur(&self) -> StoreResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let current: String = tx.query_row(
            "SELECT value FROM display_setting WHERE key = ?1",
            [SCORES_BLURRED_KEY],
            |row| row.get(0),
        )?;
        let blurred = current != "true";

        tx.execute(
            "UPDATE display_setting SET value = ?1 WHERE key = ?2",
            [if blurred { "true" } else { "false" }, SCORES_BLURRED_KEY],
        )?;
        tx.commit()?;

        tracing::info!("Scores blurred: {}", blurred);
        Ok(blurred)
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> Store {
    Store::open(":memory:").expect("in-memory store should open")
}
