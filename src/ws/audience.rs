//! Audience message handlers
//!
//! Handlers for audience-specific messages like voting and question submission.

use super::handlers::{store_error, ConnectionContext};
use crate::broadcast::broadcast_state;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{QuestionId, Team};
use std::sync::Arc;

/// Longest question text accepted from the audience
const MAX_QUESTION_CHARS: usize = 500;

pub async fn handle_submit_question(
    state: &Arc<AppState>,
    text: String,
    author: String,
) -> Option<ServerMessage> {
    let text = text.trim().to_string();
    let author = author.trim().to_string();

    if text.is_empty() || author.is_empty() {
        return Some(ServerMessage::error(
            "INVALID_QUESTION",
            "Question text and author are required",
        ));
    }
    if text.chars().count() > MAX_QUESTION_CHARS {
        return Some(ServerMessage::error(
            "INVALID_QUESTION",
            format!("Questions are limited to {} characters", MAX_QUESTION_CHARS),
        ));
    }

    tracing::info!("Question submitted by {}: {}", author, text);
    match state.create_question(text, author).await {
        Ok(question_id) => {
            broadcast_state(state).await;
            Some(ServerMessage::QuestionSubmitted { question_id })
        }
        Err(e) => Some(store_error(e)),
    }
}

pub async fn handle_vote(
    state: &Arc<AppState>,
    ctx: &ConnectionContext,
    question_id: QuestionId,
    team: Team,
) -> Option<ServerMessage> {
    let Some(attendee_id) = ctx.attendee_id.clone() else {
        return Some(ServerMessage::error(
            "NO_ATTENDEE",
            "Only audience connections can vote",
        ));
    };

    match state.cast_vote(question_id, team, attendee_id).await {
        Ok(recorded) => {
            if recorded {
                broadcast_state(state).await;
            } else {
                tracing::debug!("Vote on question {} not recorded", question_id);
            }
            Some(ServerMessage::VoteResult {
                question_id,
                recorded,
            })
        }
        Err(e) => Some(store_error(e)),
    }
}

pub async fn handle_vote_status(
    state: &Arc<AppState>,
    ctx: &ConnectionContext,
    question_id: QuestionId,
) -> Option<ServerMessage> {
    let Some(attendee_id) = ctx.attendee_id.clone() else {
        return Some(ServerMessage::error(
            "NO_ATTENDEE",
            "Vote status is only available to audience connections",
        ));
    };

    match state.vote_status(question_id, attendee_id).await {
        Ok(status) => Some(ServerMessage::VoteStatus {
            question_id,
            status,
        }),
        Err(e) => Some(store_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn ctx(id: &str) -> ConnectionContext {
        ConnectionContext::new(Role::Audience, Some(id.to_string()))
    }

    #[tokio::test]
    async fn test_submit_question_validation() {
        let state = Arc::new(AppState::in_memory().unwrap());

        let result = handle_submit_question(&state, "   ".to_string(), "Alice".to_string()).await;
        assert!(matches!(result, Some(ServerMessage::Error { .. })));

        let long = "x".repeat(MAX_QUESTION_CHARS + 1);
        let result = handle_submit_question(&state, long, "Alice".to_string()).await;
        assert!(matches!(result, Some(ServerMessage::Error { .. })));

        assert!(state.get_state().await.unwrap().questions.is_empty());
    }

    #[tokio::test]
    async fn test_submit_question_trims_and_broadcasts() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let mut rx = state.broadcast.subscribe();

        let result =
            handle_submit_question(&state, "  Why Rust? ".to_string(), " Alice ".to_string())
                .await;
        assert!(matches!(
            result,
            Some(ServerMessage::QuestionSubmitted { question_id: 1 })
        ));

        match rx.recv().await.unwrap() {
            ServerMessage::State { state } => {
                assert_eq!(state.questions[0].text, "Why Rust?");
                assert_eq!(state.questions[0].author, "Alice");
            }
            other => panic!("Expected State broadcast, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_vote_twice_not_recorded() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let id = state
            .create_question("Q1".to_string(), "Alice".to_string())
            .await
            .unwrap();

        let first = handle_vote(&state, &ctx("u1"), id, Team::A).await;
        assert!(matches!(
            first,
            Some(ServerMessage::VoteResult { recorded: true, .. })
        ));
        let second = handle_vote(&state, &ctx("u1"), id, Team::A).await;
        assert!(matches!(
            second,
            Some(ServerMessage::VoteResult { recorded: false, .. })
        ));

        match handle_vote_status(&state, &ctx("u1"), id).await {
            Some(ServerMessage::VoteStatus { status, .. }) => {
                assert!(status.has_voted);
                assert_eq!(status.team, Some(Team::A));
            }
            other => panic!("Expected VoteStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_vote_requires_attendee() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let id = state
            .create_question("Q1".to_string(), "Alice".to_string())
            .await
            .unwrap();
        let display = ConnectionContext::new(Role::Display, None);

        let result = handle_vote(&state, &display, id, Team::B).await;
        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "NO_ATTENDEE"),
            other => panic!("Expected NO_ATTENDEE, got {:?}", other),
        }
    }
}
