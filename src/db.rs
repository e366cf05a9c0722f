use serde::Serialize;
use sqlx::SqlitePool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        email TEXT NOT NULL,
        avatar_url TEXT NOT NULL,
        handle TEXT NOT NULL,
        summary TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    // handle_key is the lowercased handle; one reservation per handle,
    // written in the same transaction as the users row
    "CREATE TABLE IF NOT EXISTS handles (
        handle_key TEXT PRIMARY KEY,
        user_id TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS follows (
        follower_id TEXT NOT NULL,
        followee_id TEXT NOT NULL,
        PRIMARY KEY (follower_id, followee_id)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        chat_id TEXT NOT NULL,
        from_id TEXT NOT NULL,
        to_id TEXT NOT NULL,
        content TEXT NOT NULL,
        sent_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS messages_by_chat ON messages (chat_id, sent_at)",
];

pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppUser {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub handle: String,
    pub summary: String,
    pub created_at: i64,
    #[sqlx(skip)]
    pub following: Vec<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub from_id: String,
    pub to_id: String,
    pub content: String,
    pub sent_at: i64,
}

pub async fn fetch_user(pool: &SqlitePool, id: &str) -> Result<Option<AppUser>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, display_name, email, avatar_url, handle, summary, created_at \
         FROM users WHERE id=?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn user_exists(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query_as::<_, (i64,)>("SELECT 1 FROM users WHERE id=?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .is_some())
}

pub async fn following(pool: &SqlitePool, id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT followee_id FROM follows WHERE follower_id=? ORDER BY followee_id")
            .bind(id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use crate::now_millis;

    pub(crate) async fn pool() -> SqlitePool {
        // a single connection keeps the in-memory database alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        super::init(&pool).await.unwrap();
        pool
    }

    pub(crate) async fn seed_user(pool: &SqlitePool, id: &str, display_name: &str, handle: &str) {
        sqlx::query(
            "INSERT INTO users (id, display_name, email, avatar_url, handle, summary, created_at) \
             VALUES (?,?,?,?,?,?,?)",
        )
        .bind(id)
        .bind(display_name)
        .bind(format!("{id}@example.com"))
        .bind(format!("https://avatars.example/{id}.png"))
        .bind(handle)
        .bind("A fascinating individual.")
        .bind(now_millis())
        .execute(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO handles (handle_key, user_id) VALUES (?,?)")
            .bind(handle.to_lowercase())
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }
}
