use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::Store;
use crate::error::StoreResult;
use crate::types::*;

impl Store {
    /// Record one attendee's vote on a question.
    ///
    /// Returns `Ok(false)` without touching anything when the question is
    /// unknown, already has a winner, or the attendee has voted on it before.
    /// The insert into `individual_vote` decides races between duplicate
    /// attempts: the primary key lets only one of them through.
    pub fn cast_vote(
        &self,
        question_id: QuestionId,
        team: Team,
        attendee_id: &str,
    ) -> StoreResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let winner: Option<Option<Team>> = tx
            .query_row(
                "SELECT winner FROM questions WHERE id = ?1",
                [question_id],
                |row| row.get(0),
            )
            .optional()?;

        match winner {
            None => {
                tracing::debug!("Vote on unknown question {} ignored", question_id);
                return Ok(false);
            }
            Some(Some(winner)) => {
                tracing::debug!(
                    "Vote on question {} rejected: locked with winner {}",
                    question_id,
                    winner
                );
                return Ok(false);
            }
            Some(None) => {}
        }

        let inserted = tx.execute(
            "INSERT INTO individual_vote (question_id, attendee_id, team, timestamp)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (question_id, attendee_id) DO NOTHING",
            params![question_id, attendee_id, team, chrono::Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            tracing::debug!(
                "Attendee {} already voted on question {}",
                attendee_id,
                question_id
            );
            return Ok(false);
        }

        tx.execute(
            "UPDATE vote_tally SET count = count + 1 WHERE question_id = ?1 AND team = ?2",
            params![question_id, team],
        )?;
        tx.commit()?;

        tracing::info!(
            "Attendee {} voted {} on question {}",
            attendee_id,
            team,
            question_id
        );
        Ok(true)
    }

    /// Whether `attendee_id` has voted on `question_id`, and for which team
    pub fn vote_status(
        &self,
        question_id: QuestionId,
        attendee_id: &str,
    ) -> StoreResult<VoteStatus> {
        let conn = self.conn();
        let team: Option<Team> = conn
            .query_row(
                "SELECT team FROM individual_vote WHERE question_id = ?1 AND attendee_id = ?2",
                params![question_id, attendee_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(VoteStatus {
            has_voted: team.is_some(),
            team,
        })
    }

    /// Zero every tally and both team scores, and forget who voted so
    /// attendees can vote again. Questions and winners are kept.
    pub fn reset_votes(&self) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("UPDATE vote_tally SET count = 0", [])?;
        tx.execute("UPDATE team_score SET score = 0", [])?;
        tx.execute("DELETE FROM individual_vote", [])?;
        tx.commit()?;

        tracing::info!("All votes reset");
        Ok(())
    }
}
