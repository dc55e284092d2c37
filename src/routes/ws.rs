//! WebSocket upgrade + session loop. The session pushes a fresh view whenever
//! the studio snapshot changes and accepts submit/reset/view/ping messages.

use std::sync::Arc;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::domain::GenerationRequest;
use crate::protocol::{ClientWsMessage, ErrorKind, ServerWsMessage};
use crate::state::AppState;
use crate::studio::SubmitError;
use crate::view::render;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!(target: "lesson_studio", "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

fn submit_error_msg(e: SubmitError) -> ServerWsMessage {
    let error = match e {
        SubmitError::EmptyTopic => ErrorKind::Validation.as_code(),
        SubmitError::Busy => "BUSY",
    };
    ServerWsMessage::Error { error: error.to_string(), message: e.to_string() }
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
    let out = serde_json::to_string(msg).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "error": "SERIALIZATION", "message": e.to_string() }).to_string()
    });
    match socket.send(Message::Text(out)).await {
        Ok(()) => true,
        Err(e) => {
            error!(target: "lesson_studio", error = %e, "WS send error");
            false
        }
    }
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!(target: "lesson_studio", "WebSocket connected");
    let mut views = state.studio.subscribe();
    // Submits run off the loop so view pushes keep flowing; their refusals come back here.
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerWsMessage>();

    let first = ServerWsMessage::View { view: render(&views.borrow_and_update()) };
    if !send(&mut socket, &first).await {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    _ => break,
                };
                match msg {
                    Message::Text(txt) => {
                        let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
                            Ok(incoming) => {
                                debug!(target: "lesson_studio", "WS received: {:?}", &incoming);
                                handle_client_ws(incoming, &state, &reply_tx)
                            }
                            Err(e) => Some(ServerWsMessage::Error { error: "BAD_MESSAGE".into(), message: format!("Invalid JSON: {}", e) }),
                        };
                        if let Some(reply) = reply {
                            if !send(&mut socket, &reply).await { break; }
                        }
                    }
                    Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            changed = views.changed() => {
                if changed.is_err() { break; }
                let view = render(&views.borrow_and_update());
                if !send(&mut socket, &ServerWsMessage::View { view }).await { break; }
            }
            Some(reply) = reply_rx.recv() => {
                if !send(&mut socket, &reply).await { break; }
            }
        }
    }
    info!(target: "lesson_studio", "WebSocket disconnected");
}

/// Immediate reply for the message, if any. Submits resolve asynchronously:
/// their progress arrives as view pushes.
fn handle_client_ws(
    msg: ClientWsMessage,
    state: &AppState,
    replies: &mpsc::UnboundedSender<ServerWsMessage>,
) -> Option<ServerWsMessage> {
    match msg {
        ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

        ClientWsMessage::View => Some(ServerWsMessage::View { view: render(&state.studio.snapshot()) }),

        ClientWsMessage::Reset => state.studio.reset().err().map(submit_error_msg),

        ClientWsMessage::Submit { topic, level, variant } => {
            let request = GenerationRequest::new(topic, level).with_variant(variant);
            let studio = state.studio.clone();
            let replies = replies.clone();
            tokio::spawn(async move {
                if let Err(e) = studio.submit(request).await {
                    let _ = replies.send(submit_error_msg(e));
                }
            });
            None
        }
    }
}
