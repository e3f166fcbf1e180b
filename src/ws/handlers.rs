//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::error::StoreError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{AttendeeId, Role, Team};
use std::sync::Arc;

use super::{audience, moderator};

/// Who is on the other end of a connection
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub role: Role,
    /// Present for audience connections
    pub attendee_id: Option<AttendeeId>,
}

impl ConnectionContext {
    pub fn new(role: Role, attendee_id: Option<AttendeeId>) -> Self {
        Self { role, attendee_id }
    }
}

/// Macro to check moderator authorization and return early if unauthorized
macro_rules! check_moderator {
    ($ctx:expr, $action:expr) => {
        if $ctx.role != Role::Moderator {
            return Some(ServerMessage::error(
                "UNAUTHORIZED",
                format!("Only the moderator can {}", $action),
            ));
        }
    };
}

/// Parse a team tag from a client message, or return the error response
macro_rules! parse_team {
    ($team:expr) => {
        match $team.parse::<Team>() {
            Ok(team) => team,
            Err(e) => return Some(store_error(e)),
        }
    };
}

/// Map a store failure onto a protocol error
pub(crate) fn store_error(e: StoreError) -> ServerMessage {
    if !matches!(e, StoreError::InvalidTeam(_)) {
        tracing::error!("Store operation failed: {}", e);
    }
    ServerMessage::error(e.code(), e.to_string())
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    ctx: &ConnectionContext,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::RequestState => match state.get_state().await {
            Ok(snapshot) => Some(ServerMessage::State { state: snapshot }),
            Err(e) => Some(store_error(e)),
        },

        // Audience messages
        ClientMessage::SubmitQuestion { text, author } => {
            audience::handle_submit_question(state, text, author).await
        }

        ClientMessage::Vote { question_id, team } => {
            let team = parse_team!(team);
            audience::handle_vote(state, ctx, question_id, team).await
        }

        ClientMessage::VoteStatus { question_id } => {
            audience::handle_vote_status(state, ctx, question_id).await
        }

        // Moderator-only commands (authorization checked before dispatch)
        ClientMessage::ModeratorSetActive { question_id } => {
            check_moderator!(ctx, "set the active question");
            moderator::handle_set_active(state, question_id).await
        }

        ClientMessage::ModeratorRemoveQuestion { question_id } => {
            check_moderator!(ctx, "remove questions");
            moderator::handle_remove_question(state, question_id).await
        }

        ClientMessage::ModeratorAddVotes {
            question_id,
            team,
            amount,
        } => {
            check_moderator!(ctx, "adjust votes");
            let team = parse_team!(team);
            moderator::handle_add_votes(state, question_id, team, amount).await
        }

        ClientMessage::ModeratorSubtractVotes {
            question_id,
            team,
            amount,
        } => {
            check_moderator!(ctx, "adjust votes");
            let team = parse_team!(team);
            moderator::handle_subtract_votes(state, question_id, team, amount).await
        }

        ClientMessage::ModeratorSetWinner { question_id, team } => {
            check_moderator!(ctx, "award points");
            let team = parse_team!(team);
            moderator::handle_set_winner(state, question_id, team).await
        }

        ClientMessage::ModeratorToggleBlur => {
            check_moderator!(ctx, "toggle score blur");
            moderator::handle_toggle_blur(state).await
        }

        ClientMessage::ModeratorResetVotes { confirmed } => {
            check_moderator!(ctx, "reset votes");
            moderator::handle_reset_votes(state, confirmed).await
        }

        ClientMessage::ModeratorResetQuestions { confirmed } => {
            check_moderator!(ctx, "reset questions");
            moderator::handle_reset_questions(state, confirmed).await
        }

        ClientMessage::ModeratorLoadQuestions {
            questions,
            confirmed,
        } => {
            check_moderator!(ctx, "load questions");
            moderator::handle_load_questions(state, questions, confirmed).await
        }
    }
}
