use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{error, session::CurrentUser, ApiError, AppResult, AppState, SelfFollowPolicy};

/// Both mutations are set-membership toggles: re-following is a no-op, as
/// is unfollowing someone never followed.
pub(crate) async fn follow(
    pool: &SqlitePool,
    actor: &str,
    target: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?,?)")
        .bind(actor)
        .bind(target)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn unfollow(
    pool: &SqlitePool,
    actor: &str,
    target: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM follows WHERE follower_id=? AND followee_id=?")
        .bind(actor)
        .bind(target)
        .execute(pool)
        .await?;
    Ok(())
}

#[debug_handler(state = AppState)]
pub(crate) async fn follow_user(
    Path(target): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(policy): State<SelfFollowPolicy>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = CurrentUser::load(&session).await? else {
        return Ok(error::unauthorized());
    };

    if policy == SelfFollowPolicy::Ignore && user.id == target {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    match follow(&db_pool, &user.id, &target).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Ok(ApiError::Backend(err).into_response()),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn unfollow_user(
    Path(target): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = CurrentUser::load(&session).await? else {
        return Ok(error::unauthorized());
    };

    match unfollow(&db_pool, &user.id, &target).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Ok(ApiError::Backend(err).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{self, testing};

    use super::*;

    #[tokio::test]
    async fn following_twice_equals_following_once() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "a", "Ada", "ada").await;
        testing::seed_user(&pool, "b", "Ben", "ben").await;

        follow(&pool, "a", "b").await.unwrap();
        follow(&pool, "a", "b").await.unwrap();

        assert_eq!(db::following(&pool, "a").await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn unfollowing_a_stranger_is_a_no_op() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "a", "Ada", "ada").await;

        unfollow(&pool, "a", "b").await.unwrap();

        assert!(db::following(&pool, "a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follow_then_unfollow_round_trips() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "a", "Ada", "ada").await;
        testing::seed_user(&pool, "b", "Ben", "ben").await;

        let before = db::following(&pool, "a").await.unwrap();
        follow(&pool, "a", "b").await.unwrap();
        unfollow(&pool, "a", "b").await.unwrap();

        assert_eq!(db::following(&pool, "a").await.unwrap(), before);
    }

    #[tokio::test]
    async fn edges_are_directed() {
        let pool = testing::pool().await;
        testing::seed_user(&pool, "a", "Ada", "ada").await;
        testing::seed_user(&pool, "b", "Ben", "ben").await;

        follow(&pool, "a", "b").await.unwrap();

        assert!(db::following(&pool, "b").await.unwrap().is_empty());
    }
}
