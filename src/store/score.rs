use rusqlite::{params, OptionalExtension};

use super::Store;
use crate::error::StoreResult;
use crate::types::*;

/// Ceiling for stored tallies and scores, so they always read back as `u32`
const MAX_COUNT: i64 = u32::MAX as i64;

impl Store {
    /// Add `amount` to a question's tally for `team` and to that team's score
    pub fn add_votes(
        &self,
        question_id: QuestionId,
        team: Team,
        amount: i64,
    ) -> StoreResult<()> {
        if amount < 1 {
            return Ok(());
        }
        self.adjust_votes(question_id, team, amount.min(MAX_COUNT))
    }

    /// Subtract `amount` from a question's tally for `team` and from that
    /// team's score. Neither goes below zero.
    pub fn subtract_votes(
        &self,
        question_id: QuestionId,
        team: Team,
        amount: i64,
    ) -> StoreResult<()> {
        if amount < 1 {
            return Ok(());
        }
        self.adjust_votes(question_id, team, -(amount.min(MAX_COUNT)))
    }

    /// Apply a signed delta to tally and score together, clamping both to
    /// `0..=MAX_COUNT`. The score moves even if `question_id` matches no tally row.
    fn adjust_votes(&self, question_id: QuestionId, team: Team, delta: i64) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE vote_tally SET count = MIN(MAX(count + ?1, 0), ?4)
             WHERE question_id = ?2 AND team = ?3",
            params![delta, question_id, team, MAX_COUNT],
        )?;
        tx.execute(
            "UPDATE team_score SET score = MIN(MAX(score + ?1, 0), ?3) WHERE team = ?2",
            params![delta, team, MAX_COUNT],
        )?;
        tx.commit()?;

        tracing::info!(
            "Adjusted {} by {} on question {}",
            team,
            delta,
            question_id
        );
        Ok(())
    }

    /// Award the point for a question to `team`.
    ///
    /// Re-awarding to the same team is a no-op. Moving the award from the
    /// other team takes its point back (floor zero) before granting the new
    /// one. Unknown questions are ignored.
    pub fn set_question_winner(&self, question_id: QuestionId, team: Team) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let previous: Option<Option<Team>> = tx
            .query_row(
                "SELECT winner FROM questions WHERE id = ?1",
                [question_id],
                |row| row.get(0),
            )
            .optional()?;

        let previous = match previous {
            None => {
                tracing::debug!("Winner for unknown question {} ignored", question_id);
                return Ok(());
            }
            Some(winner) if winner == Some(team) => return Ok(()),
            Some(winner) => winner,
        };

        tx.execute(
            "UPDATE questions SET winner = ?1 WHERE id = ?2",
            params![team, question_id],
        )?;
        if let Some(previous) = previous {
            tx.execute(
                "UPDATE team_score SET score = score - 1 WHERE team = ?1 AND score > 0",
                [previous],
            )?;
        }
        tx.execute(
            "UPDATE team_score SET score = MIN(score + 1, ?2) WHERE team = ?1",
            params![team, MAX_COUNT],
        )?;
        tx.commit()?;

        match previous {
            Some(previous) => tracing::info!(
                "Question {} winner changed from {} to {}",
                question_id,
                previous,
                team
            ),
            None => tracing::info!("Question {} won by {}", question_id, team),
        }
        Ok(())
    }
}
