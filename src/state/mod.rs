//! Shared application state: a thin async facade over the SQLite store.
//!
//! Nothing here caches store contents. Each call runs the blocking store
//! operation on the blocking thread pool and returns its result unchanged.

use crate::error::{StoreError, StoreResult};
use crate::protocol::ServerMessage;
use crate::store::Store;
use crate::types::*;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    /// Labels shown for the two teams
    pub team_names: TeamNames,
    /// Panel roster in seating order
    pub panelists: Vec<Panelist>,
    /// Broadcast channel for pushing state to every connected client
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(store: Store, team_names: TeamNames) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            store: Arc::new(store),
            team_names,
            panelists: Vec::new(),
            broadcast: tx,
        }
    }

    pub fn with_panelists(mut self, panelists: Vec<Panelist>) -> Self {
        self.panelists = seating_order(panelists);
        self
    }

    /// State backed by a fresh in-memory store (tests and demos)
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::new(Store::open(":memory:")?, TeamNames::default()))
    }

    async fn with_store<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    pub async fn create_question(&self, text: String, author: String) -> StoreResult<QuestionId> {
        self.with_store(move |s| s.create_question(&text, &author)).await
    }

    pub async fn set_active_question(&self, question_id: Option<QuestionId>) -> StoreResult<()> {
        self.with_store(move |s| s.set_active_question(question_id)).await
    }

    pub async fn cast_vote(
        &self,
        question_id: QuestionId,
        team: Team,
        attendee_id: AttendeeId,
    ) -> StoreResult<bool> {
        self.with_store(move |s| s.cast_vote(question_id, team, &attendee_id)).await
    }

    pub async fn vote_status(
        &self,
        question_id: QuestionId,
        attendee_id: AttendeeId,
    ) -> StoreResult<VoteStatus> {
        self.with_store(move |s| s.vote_status(question_id, &attendee_id)).await
    }

    pub async fn remove_question(&self, question_id: QuestionId) -> StoreResult<()> {
        self.with_store(move |s| s.remove_question(question_id)).await
    }

    pub async fn reset_votes(&self) -> StoreResult<()> {
        self.with_store(|s| s.reset_votes()).await
    }

    pub async fn reset_questions(&self) -> StoreResult<()> {
        self.with_store(|s| s.reset_questions()).await
    }

    pub async fn load_questions(
        &self,
        questions: Vec<NewQuestion>,
    ) -> StoreResult<Vec<QuestionId>> {
        self.with_store(move |s| s.load_questions(&questions)).await
    }

    pub async fn add_votes(
        &self,
        question_id: QuestionId,
        team: Team,
        amount: i64,
    ) -> StoreResult<()> {
        self.with_store(move |s| s.add_votes(question_id, team, amount)).await
    }

    pub async fn subtract_votes(
        &self,
        question_id: QuestionId,
        team: Team,
        amount: i64,
    ) -> StoreResult<()> {
        self.with_store(move |s| s.subtract_votes(question_id, team, amount)).await
    }

    pub async fn set_question_winner(
        &self,
        question_id: QuestionId,
        team: Team,
    ) -> StoreResult<()> {
        self.with_store(move |s| s.set_question_winner(question_id, team)).await
    }

    pub async fn toggle_scores_blur(&self) -> StoreResult<bool> {
        self.with_store(|s| s.toggle_scores_blur()).await
    }

    /// Full state snapshot, re-read from the store on every call
    pub async fn get_state(&self) -> StoreResult<StateSnapshot> {
        self.with_store(|s| s.snapshot()).await
    }
}
