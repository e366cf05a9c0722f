use axum::{
    debug_handler,
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tower_sessions::Session;

use crate::{error, session::CurrentUser, AppResult, AppState};

use super::Presence;

/// The liveness socket. Holding it open is the online marker; every exit
/// path drops the ticket, which is the armed disconnect handler.
#[debug_handler(state = AppState)]
pub(crate) async fn presence_ws(
    State(presence): State<Presence>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(user) = CurrentUser::load(&session).await? else {
        return Ok(error::unauthorized());
    };

    Ok(ws.on_upgrade(move |stream| run(stream, presence, user.id)))
}

async fn run(stream: WebSocket, presence: Presence, user_id: String) {
    let _ticket = presence.connect(&user_id);
    let mut events = presence.events();
    let (mut sender, mut receiver) = stream.split();

    let forward = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(json.into()).await.is_err() {
                break;
            }
        }
    });

    // Nothing meaningful arrives on this socket; drain until the peer goes.
    while let Some(Ok(_)) = receiver.next().await {}

    forward.abort();
}
