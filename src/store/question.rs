use rusqlite::{params, Transaction};

use super::Store;
use crate::error::StoreResult;
use crate::types::*;

/// Insert a question with zeroed tallies for both teams
fn insert_question(
    tx: &Transaction<'_>,
    text: &str,
    author: &str,
    timestamp: &str,
) -> StoreResult<QuestionId> {
    tx.execute(
        "INSERT INTO questions (text, author, timestamp, is_active, is_past)
         VALUES (?1, ?2, ?3, 0, 0)",
        params![text, author, timestamp],
    )?;
    let id = tx.last_insert_rowid();

    for team in Team::ALL {
        tx.execute(
            "INSERT INTO vote_tally (question_id, team, count) VALUES (?1, ?2, 0)",
            params![id, team],
        )?;
    }
    Ok(id)
}

/// Delete every question and its dependent rows, and zero team scores
fn clear_questions(tx: &Transaction<'_>) -> StoreResult<()> {
    tx.execute("DELETE FROM vote_tally", [])?;
    tx.execute("DELETE FROM individual_vote", [])?;
    tx.execute("DELETE FROM questions", [])?;
    tx.execute("UPDATE team_score SET score = 0", [])?;
    Ok(())
}

impl Store {
    /// Add a new question (neither active nor past) and return its id
    pub fn create_question(&self, text: &str, author: &str) -> StoreResult<QuestionId> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let id = insert_question(&tx, text, author, &chrono::Utc::now().to_rfc3339())?;
        tx.commit()?;

        tracing::info!("Question {} added by {}", id, author);
        Ok(id)
    }

    /// Make `question_id` the active question, moving the current one to past.
    /// `None` only retires the current active question.
    pub fn set_active_question(&self, question_id: Option<QuestionId>) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE questions SET is_active = 0, is_past = 1 WHERE is_active = 1",
            [],
        )?;
        if let Some(id) = question_id {
            tx.execute(
                "UPDATE questions SET is_active = 1, is_past = 0 WHERE id = ?1",
                [id],
            )?;
        }
        tx.commit()?;

        tracing::info!("Active question set to {:?}", question_id);
        Ok(())
    }

    /// Remove a question together with its tallies and vote records
    pub fn remove_question(&self, question_id: QuestionId) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM vote_tally WHERE question_id = ?1", [question_id])?;
        tx.execute(
            "DELETE FROM individual_vote WHERE question_id = ?1",
            [question_id],
        )?;
        let removed = tx.execute("DELETE FROM questions WHERE id = ?1", [question_id])?;
        tx.commit()?;

        if removed > 0 {
            tracing::info!("Question {} removed", question_id);
        }
        Ok(())
    }

    /// Delete all questions, tallies and vote records; zero both team scores
    pub fn reset_questions(&self) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        clear_questions(&tx)?;
        tx.commit()?;

        tracing::info!("All questions reset");
        Ok(())
    }

    /// Replace every question with `questions`, in order, as one unit.
    /// Returns the ids assigned to the new questions.
    pub fn load_questions(&self, questions: &[NewQuestion]) -> StoreResult<Vec<QuestionId>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        clear_questions(&tx)?;

        let timestamp = chrono::Utc::now().to_rfc3339();
        let ids = questions
            .iter()
            .map(|q| insert_question(&tx, &q.text, &q.author, &timestamp))
            .collect::<StoreResult<Vec<_>>>()?;
        tx.commit()?;

        tracing::info!("Loaded {} questions", ids.len());
        Ok(ids)
    }
}
