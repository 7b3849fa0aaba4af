use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_match_runs(socket, state))
}

async fn stream_match_runs(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.match_events_tx.subscribe();

    info!("match subscriber connected");

    let send_task = tokio::spawn(async move {
        loop {
            let run = match rx.recv().await {
                Ok(run) => run,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "match subscriber lagged behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&run) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize match run for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("match subscriber disconnected");
}
