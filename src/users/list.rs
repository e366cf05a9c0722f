use axum::{
    debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{error, presence::Presence, session::CurrentUser, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserEntry {
    pub id: String,
    pub display_name: String,
    pub handle: String,
    pub avatar_url: String,
    pub summary: String,
    pub online: bool,
    pub followed: bool,
}

type UserRow = (String, String, String, String, String, bool);

/// Everyone but the viewer, matched on name or handle, the viewer's
/// follows first, then alphabetical.
pub(crate) async fn query_users(
    db_pool: &SqlitePool,
    viewer: &str,
    needle: &str,
) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT u.id, u.display_name, u.handle, u.avatar_url, u.summary, \
                (f.followee_id IS NOT NULL) AS followed \
         FROM users u \
         LEFT JOIN follows f ON f.follower_id=? AND f.followee_id=u.id \
         WHERE u.id<>? AND (u.display_name LIKE '%'||?||'%' OR u.handle LIKE '%'||?||'%') \
         ORDER BY followed DESC, u.display_name COLLATE NOCASE ASC",
    )
    .bind(viewer)
    .bind(viewer)
    .bind(needle)
    .bind(needle)
    .fetch_all(db_pool)
    .await
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_users(
    Query(ListQuery { q }): Query<ListQuery>,
    State(db_pool): State<SqlitePool>,
    State(presence): State<Presence>,
    session: Session,
) -> AppResult<Response> {
    let Some(viewer) = CurrentUser::load(&session).await? else {
        return Ok(error::unauthorized());
    };

    let rows = query_users(&db_pool, &viewer.id, q.as_deref().unwrap_or("")).await?;
    let users: Vec<UserEntry> = rows
        .into_iter()
        .map(|(id, display_name, handle, avatar_url, summary, followed)| UserEntry {
            online: presence.is_online(&id),
            id,
            display_name,
            handle,
            avatar_url,
            summary,
            followed,
        })
        .collect();

    Ok(Json(users).into_response())
}

#[cfg(test)]
mod tests {
    use crate::db::testing;
    use crate::users::follow::follow;

    use super::*;

    #[tokio::test]
    async fn followed_users_sort_first_then_alphabetical() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "me", "Me", "me").await;
        testing::seed_user(&pool, "b", "Bob", "bob").await;
        testing::seed_user(&pool, "a", "alice", "wonder").await;
        testing::seed_user(&pool, "c", "Carol", "carol").await;
        follow(&pool, "me", "c").await.unwrap();

        let rows = query_users(&pool, "me", "").await.unwrap();
        let names: Vec<&str> = rows.iter().map(|row| row.1.as_str()).collect();

        assert_eq!(names, vec!["Carol", "alice", "Bob"]);
        assert!(rows[0].5);
        assert!(!rows[1].5);
    }

    #[tokio::test]
    async fn search_matches_name_or_handle_case_insensitively() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "me", "Me", "me").await;
        testing::seed_user(&pool, "a", "alice", "wonder").await;
        testing::seed_user(&pool, "b", "Bob", "builder").await;

        let by_name = query_users(&pool, "me", "ALI").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].0, "a");

        let by_handle = query_users(&pool, "me", "build").await.unwrap();
        assert_eq!(by_handle.len(), 1);
        assert_eq!(by_handle[0].0, "b");
    }

    #[tokio::test]
    async fn viewer_is_excluded_from_their_own_listing() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "me", "Me", "me").await;

        assert!(query_users(&pool, "me", "").await.unwrap().is_empty());
    }
}
