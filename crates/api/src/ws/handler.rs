use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parking_events::ParkingEvent;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection joins the viewer group and is managed
/// by two tasks (sender + receiver).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Joins the viewer group with a `status_changed` snapshot queued.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Drains inbound frames until the client leaves, then cleans up.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let ws_manager = state.ws_manager.clone();
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = join_viewer(&state, conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Clients only listen; inbound frames other than Close are ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Join `conn_id` to the viewer group with the current lot status queued as
/// its first frame.
///
/// If the status cannot be read the viewer still joins, and picks up the
/// next `status_changed` event.
pub async fn join_viewer(state: &AppState, conn_id: String) -> UnboundedReceiver<Message> {
    let snapshot = match state.parking.lot_status().await {
        Ok(status) => ParkingEvent::StatusChanged(status.into())
            .to_json()
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match snapshot {
        Ok(json) => {
            state
                .ws_manager
                .add_with_first(conn_id, Message::Text(json.into()))
                .await
        }
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Could not build lot status snapshot");
            state.ws_manager.add(conn_id).await
        }
    }
}
