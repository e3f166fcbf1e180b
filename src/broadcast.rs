use crate::protocol::ServerMessage;
use crate::state::AppState;

/// Push a fresh snapshot to every connected client after a mutation
pub async fn broadcast_state(state: &AppState) {
    match state.get_state().await {
        Ok(snapshot) => {
            // Ignore send errors (no receivers connected is fine)
            let _ = state.broadcast.send(ServerMessage::State { state: snapshot });
        }
        Err(e) => tracing::error!("Failed to read state for broadcast: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_state_reaches_subscribers() {
        let state = AppState::in_memory().unwrap();
        let mut rx = state.broadcast.subscribe();

        state
            .create_question("Q1".to_string(), "Alice".to_string())
            .await
            .unwrap();
        broadcast_state(&state).await;

        match rx.recv().await.unwrap() {
            ServerMessage::State { state } => assert_eq!(state.questions.len(), 1),
            other => panic!("Expected State message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_fine() {
        let state = AppState::in_memory().unwrap();
        broadcast_state(&state).await;
    }
}
