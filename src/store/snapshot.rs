use rusqlite::{Row, Transaction};

use super::{Store, SCORES_BLURRED_KEY};
use crate::error::StoreResult;
use crate::types::*;

const QUESTION_COLUMNS: &str = "
    SELECT q.id, q.text, q.author, q.timestamp, q.is_active, q.is_past, q.winner,
           COALESCE(a.count, 0), COALESCE(b.count, 0)
    FROM questions q
    LEFT JOIN vote_tally a ON a.question_id = q.id AND a.team = 'team_a'
    LEFT JOIN vote_tally b ON b.question_id = q.id AND b.team = 'team_b'";

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        text: row.get(1)?,
        author: row.get(2)?,
        timestamp: row.get(3)?,
        is_active: row.get(4)?,
        is_past: row.get(5)?,
        winner: row.get(6)?,
        votes: VoteTally {
            team_a: row.get(7)?,
            team_b: row.get(8)?,
        },
    })
}

fn load_questions(tx: &Transaction<'_>, past: bool) -> StoreResult<Vec<Question>> {
    let order = if past { "DESC" } else { "ASC" };
    let sql = format!("{QUESTION_COLUMNS} WHERE q.is_past = ?1 ORDER BY q.id {order}");
    let mut stmt = tx.prepare(&sql)?;
    let questions = stmt
        .query_map([past], question_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

impl Store {
    /// Read the full state every view renders from, as one consistent read
    pub fn snapshot(&self) -> StoreResult<StateSnapshot> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let blurred: String = tx.query_row(
            "SELECT value FROM display_setting WHERE key = ?1",
            [SCORES_BLURRED_KEY],
            |row| row.get(0),
        )?;

        let questions = load_questions(&tx, false)?;
        let past_questions = load_questions(&tx, true)?;
        let active_question = questions.iter().find(|q| q.is_active).map(|q| q.id);

        let mut scores = TeamScores::default();
        {
            let mut stmt = tx.prepare("SELECT team, score FROM team_score")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, Team>(0)?, row.get::<_, u32>(1)?))
            })?;
            for row in rows {
                let (team, score) = row?;
                scores.set(team, score);
            }
        }
        tx.commit()?;

        Ok(StateSnapshot {
            active_question,
            questions,
            past_questions,
            scores,
            display_settings: DisplaySettings {
                scores_blurred: blurred == "true",
            },
            last_updated: chrono::Utc::now().to_rfc3339(),
        })
    }
}
