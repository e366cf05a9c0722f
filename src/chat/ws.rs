use axum::{
    debug_handler,
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower_sessions::Session;

use crate::{error, presence::Presence, session::CurrentUser, AppResult, AppState};

use super::msg::{self, ChatEvent, SendMessageFrame};

#[debug_handler(state = AppState)]
pub(crate) async fn chat_ws(
    Path(peer): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(chat_tx): State<broadcast::Sender<ChatEvent>>,
    State(presence): State<Presence>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(user) = CurrentUser::load(&session).await? else {
        return Ok(error::unauthorized());
    };

    Ok(ws.on_upgrade(move |stream| run_chat(stream, db_pool, chat_tx, presence, user.id, peer)))
}

async fn run_chat(
    stream: WebSocket,
    db_pool: SqlitePool,
    chat_tx: broadcast::Sender<ChatEvent>,
    presence: Presence,
    user_id: String,
    peer: String,
) {
    // an open chat also counts as liveness
    let _ticket = presence.connect(&user_id);

    let chat_id = super::chat_id(&user_id, &peer);
    let mut rx = chat_tx.subscribe();
    let (mut sender, mut receiver) = stream.split();

    let forward_chat_id = chat_id.clone();
    let forward = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if event.chat_id != forward_chat_id {
                continue;
            }
            let Ok(json) = serde_json::to_string(&event.message) else {
                continue;
            };
            if sender.send(json.into()).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        let Ok(SendMessageFrame { content }) = serde_json::from_slice(&frame.into_data()) else {
            continue;
        };

        if let Err(err) = msg::send_message(&db_pool, &chat_tx, &user_id, &peer, content).await {
            tracing::warn!(error = %err, chat_id = %chat_id, "failed to store message");
        }
    }

    forward.abort();
}
