use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh state snapshot
    RequestState,
    SubmitQuestion {
        text: String,
        author: String,
    },
    /// Team is carried as a raw tag and validated by the handler
    Vote {
        question_id: QuestionId,
        team: String,
    },
    VoteStatus {
        question_id: QuestionId,
    },
    // Moderator-only messages
    ModeratorSetActive {
        question_id: Option<QuestionId>,
    },
    ModeratorRemoveQuestion {
        question_id: QuestionId,
    },
    ModeratorAddVotes {
        question_id: QuestionId,
        team: String,
        amount: i64,
    },
    ModeratorSubtractVotes {
        question_id: QuestionId,
        team: String,
        amount: i64,
    },
    ModeratorSetWinner {
        question_id: QuestionId,
        team: String,
    },
    ModeratorToggleBlur,
    /// Destructive: requires `confirmed: true`
    ModeratorResetVotes {
        #[serde(default)]
        confirmed: bool,
    },
    /// Destructive: requires `confirmed: true`
    ModeratorResetQuestions {
        #[serde(default)]
        confirmed: bool,
    },
    /// Replace all questions with a seed list. Destructive: requires `confirmed: true`
    ModeratorLoadQuestions {
        questions: Vec<NewQuestion>,
        #[serde(default)]
        confirmed: bool,
    },
}

/// Moderator actions that must be confirmed in the same request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DestructiveAction {
    ResetVotes,
    ResetQuestions,
    LoadQuestions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        /// Set for audience connections
        #[serde(skip_serializing_if = "Option::is_none")]
        attendee_id: Option<AttendeeId>,
        team_names: TeamNames,
        panelists: Vec<Panelist>,
        state: StateSnapshot,
        server_now: String,
    },
    State {
        state: StateSnapshot,
    },
    QuestionSubmitted {
        question_id: QuestionId,
    },
    /// `recorded: false` means duplicate, locked, or unknown question
    VoteResult {
        question_id: QuestionId,
        recorded: bool,
    },
    VoteStatus {
        question_id: QuestionId,
        status: crate::types::VoteStatus,
    },
    BlurToggled {
        scores_blurred: bool,
    },
    /// The action was not performed; resend it with `confirmed: true`
    ConfirmationRequired {
        action: DestructiveAction,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            msg: msg.into(),
        }
    }
}
