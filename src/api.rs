//! Read-only HTTP API endpoints.
//!
//! These serve the same snapshot the WebSocket clients receive, for displays
//! and tooling that only poll.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::StoreError;
use crate::state::AppState;
use crate::types::{Panelist, QuestionId};

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        tracing::error!("API request failed: {}", self);
        let status = match self {
            StoreError::InvalidTeam(_) => StatusCode::BAD_REQUEST,
            StoreError::Sqlite(_) | StoreError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Routes under `/api`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/panelists", get(get_panelists))
        .route(
            "/api/questions/{question_id}/vote-status",
            get(get_vote_status),
        )
}

async fn health() -> &'static str {
    "ok"
}

/// Full state snapshot.
///
/// GET /api/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Response {
    match state.get_state().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Panel roster in seating order.
///
/// GET /api/panelists
pub async fn get_panelists(State(state): State<Arc<AppState>>) -> Json<Vec<Panelist>> {
    Json(state.panelists.clone())
}

#[derive(Debug, Deserialize)]
pub struct VoteStatusQuery {
    pub attendee: String,
}

/// Whether an attendee has voted on a question.
///
/// GET /api/questions/{question_id}/vote-status?attendee=...
pub async fn get_vote_status(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<QuestionId>,
    Query(query): Query<VoteStatusQuery>,
) -> Response {
    match state.vote_status(question_id, query.attendee).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PanelSide, StateSnapshot, Team, VoteStatus};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_json<T: serde::de::DeserializeOwned>(state: Arc<AppState>, uri: &str) -> T {
        let app = router().with_state(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_state() {
        let state = Arc::new(AppState::in_memory().unwrap());
        state
            .create_question("Q1".to_string(), "Alice".to_string())
            .await
            .unwrap();

        let snapshot: StateSnapshot = get_json(state, "/api/state").await;
        assert_eq!(snapshot.questions.len(), 1);
        assert_eq!(snapshot.questions[0].author, "Alice");
    }

    #[tokio::test]
    async fn test_get_panelists() {
        let panelist = |name: &str, side| Panelist {
            name: name.to_string(),
            position: "Engineer".to_string(),
            company: "Acme".to_string(),
            side,
            image_url: None,
        };
        let state = AppState::in_memory().unwrap().with_panelists(vec![
            panelist("Bo", PanelSide::TeamB),
            panelist("Mo", PanelSide::Moderator),
            panelist("Al", PanelSide::TeamA),
        ]);

        let panelists: Vec<Panelist> = get_json(Arc::new(state), "/api/panelists").await;
        let names: Vec<_> = panelists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Al", "Mo", "Bo"]);

        let empty: Vec<Panelist> =
            get_json(Arc::new(AppState::in_memory().unwrap()), "/api/panelists").await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_get_vote_status() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let id = state
            .create_question("Q1".to_string(), "Alice".to_string())
            .await
            .unwrap();
        state.cast_vote(id, Team::B, "u1".to_string()).await.unwrap();

        let status: VoteStatus = get_json(
            state.clone(),
            &format!("/api/questions/{}/vote-status?attendee=u1", id),
        )
        .await;
        assert!(status.has_voted);
        assert_eq!(status.team, Some(Team::B));

        let status: VoteStatus = get_json(
            state,
            &format!("/api/questions/{}/vote-status?attendee=u2", id),
        )
        .await;
        assert!(!status.has_voted);
    }

    #[tokio::test]
    async fn test_vote_status_requires_attendee() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let app = router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/questions/1/vote-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
