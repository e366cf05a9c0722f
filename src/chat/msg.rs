use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db::ChatMessage, error, now_millis, session::CurrentUser, AppResult, AppState};

#[derive(Clone, Debug, Serialize)]
pub struct ChatEvent {
    pub chat_id: String,
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageFrame {
    pub(crate) content: String,
}

pub(crate) async fn send_message(
    db_pool: &SqlitePool,
    tx: &broadcast::Sender<ChatEvent>,
    from_id: &str,
    to_id: &str,
    content: String,
) -> Result<ChatMessage, sqlx::Error> {
    let message = ChatMessage {
        id: Uuid::now_v7().to_string(),
        chat_id: super::chat_id(from_id, to_id),
        from_id: from_id.to_owned(),
        to_id: to_id.to_owned(),
        content,
        sent_at: now_millis(),
    };

    sqlx::query(
        "INSERT INTO messages (id, chat_id, from_id, to_id, content, sent_at) VALUES (?,?,?,?,?,?)",
    )
    .bind(&message.id)
    .bind(&message.chat_id)
    .bind(&message.from_id)
    .bind(&message.to_id)
    .bind(&message.content)
    .bind(message.sent_at)
    .execute(db_pool)
    .await?;

    // nobody listening is fine
    let _ = tx.send(ChatEvent {
        chat_id: message.chat_id.clone(),
        message: message.clone(),
    });

    Ok(message)
}

#[debug_handler(state = AppState)]
pub(crate) async fn history(
    Path(peer): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = CurrentUser::load(&session).await? else {
        return Ok(error::unauthorized());
    };

    let chat_id = super::chat_id(&user.id, &peer);
    let messages: Vec<ChatMessage> = sqlx::query_as(
        "SELECT id, chat_id, from_id, to_id, content, sent_at \
         FROM messages WHERE chat_id=? ORDER BY sent_at ASC, id ASC",
    )
    .bind(&chat_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(messages).into_response())
}

#[cfg(test)]
mod tests {
    use crate::db::testing;

    use super::*;

    #[tokio::test]
    async fn sending_persists_and_broadcasts() {
        let pool = testing::pool().await;
        let (tx, mut rx) = broadcast::channel(8);

        let sent = send_message(&pool, &tx, "b", "a", "hi there".to_owned())
            .await
            .unwrap();

        assert_eq!(sent.chat_id, "a-b");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.chat_id, "a-b");
        assert_eq!(event.message.content, "hi there");

        let stored: Vec<ChatMessage> =
            sqlx::query_as("SELECT id, chat_id, from_id, to_id, content, sent_at FROM messages")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].from_id, "b");
        assert_eq!(stored[0].to_id, "a");
    }

    #[tokio::test]
    async fn history_is_scoped_to_one_pair() {
        let pool = testing::pool().await;
        let (tx, _rx) = broadcast::channel(8);

        send_message(&pool, &tx, "a", "b", "to b".to_owned())
            .await
            .unwrap();
        send_message(&pool, &tx, "a", "c", "to c".to_owned())
            .await
            .unwrap();

        let ab: Vec<ChatMessage> = sqlx::query_as(
            "SELECT id, chat_id, from_id, to_id, content, sent_at \
             FROM messages WHERE chat_id=? ORDER BY sent_at ASC, id ASC",
        )
        .bind(super::super::chat_id("b", "a"))
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(ab.len(), 1);
        assert_eq!(ab[0].content, "to b");
    }
}
