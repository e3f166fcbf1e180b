pub mod audience;
pub mod handlers;
pub mod moderator;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::error::StoreResult;
use crate::types::{AttendeeId, Role};
use handlers::ConnectionContext;

/// Longest attendee id accepted from a client
const MAX_ATTENDEE_ID_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
    /// Attendee id from a previous session, so reconnects keep their votes
    pub attendee: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: role={:?}, attendee={:?}",
        params.role,
        params.attendee
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

pub fn parse_role(role: Option<&str>) -> Role {
    match role {
        Some("moderator") => Role::Moderator,
        Some("display") => Role::Display,
        _ => Role::Audience,
    }
}

/// Reuse the client's attendee id if it looks sane, otherwise mint a new one
pub fn resolve_attendee_id(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(id) if !id.is_empty() && id.len() <= MAX_ATTENDEE_ID_LEN => id.to_string(),
        _ => ulid::Ulid::new().to_string(),
    }
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// First message on every connection
pub async fn welcome_message(
    state: &AppState,
    role: Role,
    attendee_id: Option<AttendeeId>,
) -> StoreResult<ServerMessage> {
    Ok(ServerMessage::Welcome {
        protocol: "1.0".to_string(),
        role,
        attendee_id,
        team_names: state.team_names.clone(),
        panelists: state.panelists.clone(),
        state: state.get_state().await?,
        server_now: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let role = parse_role(params.role.as_deref());
    let attendee_id = match role {
        Role::Audience => Some(resolve_attendee_id(params.attendee.as_deref())),
        _ => None,
    };
    let ctx = ConnectionContext::new(role, attendee_id.clone());

    tracing::info!(
        "WebSocket connected with role: {:?}, attendee: {:?}",
        role,
        attendee_id
    );

    let welcome = match welcome_message(&state, role, attendee_id).await {
        Ok(welcome) => welcome,
        Err(e) => {
            tracing::error!("Failed to load state for welcome: {}", e);
            let _ = send_json(&mut sender, &handlers::store_error(e)).await;
            return;
        }
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let mut broadcast_rx = state.broadcast.subscribe();

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Client lagged, skipped {} broadcasts", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &ctx, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        if let Some(response) = response {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}
