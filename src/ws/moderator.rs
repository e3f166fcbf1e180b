//! Moderator-only command handlers
//!
//! All handlers in this module require the Moderator role.
//! Authorization is checked in the main dispatch layer before calling these.

use super::handlers::store_error;
use crate::broadcast::broadcast_state;
use crate::error::StoreResult;
use crate::protocol::{DestructiveAction, ServerMessage};
use crate::state::AppState;
use crate::types::{NewQuestion, QuestionId, Team};
use std::sync::Arc;

/// Answer a mutation with the fresh state, and push it to everyone else
async fn respond_with_state(
    state: &Arc<AppState>,
    result: StoreResult<()>,
) -> Option<ServerMessage> {
    if let Err(e) = result {
        return Some(store_error(e));
    }
    broadcast_state(state).await;
    match state.get_state().await {
        Ok(snapshot) => Some(ServerMessage::State { state: snapshot }),
        Err(e) => Some(store_error(e)),
    }
}

pub async fn handle_set_active(
    state: &Arc<AppState>,
    question_id: Option<QuestionId>,
) -> Option<ServerMessage> {
    tracing::info!("Moderator setting active question: {:?}", question_id);
    let result = state.set_active_question(question_id).await;
    respond_with_state(state, result).await
}

pub async fn handle_remove_question(
    state: &Arc<AppState>,
    question_id: QuestionId,
) -> Option<ServerMessage> {
    tracing::info!("Moderator removing question {}", question_id);
    let result = state.remove_question(question_id).await;
    respond_with_state(state, result).await
}

pub async fn handle_add_votes(
    state: &Arc<AppState>,
    question_id: QuestionId,
    team: Team,
    amount: i64,
) -> Option<ServerMessage> {
    tracing::info!(
        "Moderator adding {} votes for {} on question {}",
        amount,
        team,
        question_id
    );
    let result = state.add_votes(question_id, team, amount).await;
    respond_with_state(state, result).await
}

pub async fn handle_subtract_votes(
    state: &Arc<AppState>,
    question_id: QuestionId,
    team: Team,
    amount: i64,
) -> Option<ServerMessage> {
    tracing::info!(
        "Moderator subtracting {} votes for {} on question {}",
        amount,
        team,
        question_id
    );
    let result = state.subtract_votes(question_id, team, amount).await;
    respond_with_state(state, result).await
}

pub async fn handle_set_winner(
    state: &Arc<AppState>,
    question_id: QuestionId,
    team: Team,
) -> Option<ServerMessage> {
    tracing::info!("Moderator awarding question {} to {}", question_id, team);
    let result = state.set_question_winner(question_id, team).await;
    respond_with_state(state, result).await
}

pub async fn handle_toggle_blur(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.toggle_scores_blur().await {
        Ok(scores_blurred) => {
            broadcast_state(state).await;
            Some(ServerMessage::BlurToggled { scores_blurred })
        }
        Err(e) => Some(store_error(e)),
    }
}

pub async fn handle_reset_votes(state: &Arc<AppState>, confirmed: bool) -> Option<ServerMessage> {
    if !confirmed {
        return Some(ServerMessage::ConfirmationRequired {
            action: DestructiveAction::ResetVotes,
        });
    }
    tracing::warn!("Moderator resetting all votes");
    let result = state.reset_votes().await;
    respond_with_state(state, result).await
}

pub async fn handle_reset_questions(
    state: &Arc<AppState>,
    confirmed: bool,
) -> Option<ServerMessage> {
    if !confirmed {
        return Some(ServerMessage::ConfirmationRequired {
            action: DestructiveAction::ResetQuestions,
        });
    }
    tracing::warn!("Moderator resetting all questions");
    let result = state.reset_questions().await;
    respond_with_state(state, result).await
}

pub async fn handle_load_questions(
    state: &Arc<AppState>,
    questions: Vec<NewQuestion>,
    confirmed: bool,
) -> Option<ServerMessage> {
    if !confirmed {
        return Some(ServerMessage::ConfirmationRequired {
            action: DestructiveAction::LoadQuestions,
        });
    }
    tracing::warn!("Moderator replacing questions with {} seeded", questions.len());
    let result = state.load_questions(questions).await.map(|_| ());
    respond_with_state(state, result).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn state_with_question() -> (Arc<AppState>, QuestionId) {
        let state = Arc::new(AppState::in_memory().unwrap());
        let id = state
            .create_question("Q1".to_string(), "Alice".to_string())
            .await
            .unwrap();
        (state, id)
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let (state, id) = state_with_question().await;
        state.cast_vote(id, Team::A, "u1".to_string()).await.unwrap();

        let result = handle_reset_questions(&state, false).await;
        assert!(matches!(
            result,
            Some(ServerMessage::ConfirmationRequired {
                action: DestructiveAction::ResetQuestions
            })
        ));
        let result = handle_reset_votes(&state, false).await;
        assert!(matches!(
            result,
            Some(ServerMessage::ConfirmationRequired {
                action: DestructiveAction::ResetVotes
            })
        ));

        // Nothing changed
        let snapshot = state.get_state().await.unwrap();
        assert_eq!(snapshot.questions.len(), 1);
        assert_eq!(snapshot.questions[0].votes.team_a, 1);

        match handle_reset_questions(&state, true).await {
            Some(ServerMessage::State { state }) => assert!(state.questions.is_empty()),
            other => panic!("Expected State, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_winner_responds_with_scores() {
        let (state, id) = state_with_question().await;

        handle_set_winner(&state, id, Team::A).await;
        match handle_set_winner(&state, id, Team::B).await {
            Some(ServerMessage::State { state }) => {
                assert_eq!(state.scores.team_a, 0);
                assert_eq!(state.scores.team_b, 1);
                assert_eq!(state.questions[0].winner, Some(Team::B));
            }
            other => panic!("Expected State, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adjust_votes() {
        let (state, id) = state_with_question().await;

        handle_add_votes(&state, id, Team::B, 10).await;
        match handle_subtract_votes(&state, id, Team::B, 4).await {
            Some(ServerMessage::State { state }) => {
                assert_eq!(state.questions[0].votes.team_b, 6);
                assert_eq!(state.scores.team_b, 6);
            }
            other => panic!("Expected State, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_questions() {
        let (state, _) = state_with_question().await;
        let seed = vec![NewQuestion {
            text: "Seeded".to_string(),
            author: "Moderator".to_string(),
        }];

        let result = handle_load_questions(&state, seed.clone(), false).await;
        assert!(matches!(
            result,
            Some(ServerMessage::ConfirmationRequired { .. })
        ));

        match handle_load_questions(&state, seed, true).await {
            Some(ServerMessage::State { state }) => {
                assert_eq!(state.questions.len(), 1);
                assert_eq!(state.questions[0].text, "Seeded");
            }
            other => panic!("Expected State, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_toggle_blur() {
        let (state, _) = state_with_question().await;
        assert!(matches!(
            handle_toggle_blur(&state).await,
            Some(ServerMessage::BlurToggled {
                scores_blurred: true
            })
        ));
    }
}
