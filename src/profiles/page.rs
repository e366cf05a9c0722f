use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, error, presence::Presence, session::CurrentUser, AppResult, AppState};

#[derive(Debug, Serialize)]
struct PublicProfile {
    id: String,
    display_name: String,
    handle: String,
    avatar_url: String,
    summary: String,
    online: bool,
}

#[debug_handler(state = AppState)]
pub(crate) async fn me(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = CurrentUser::load(&session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(mut profile) = db::fetch_user(&db_pool, &user.id).await? else {
        // signed in but never bootstrapped
        return Ok(Redirect::to("/p/new").into_response());
    };
    profile.following = db::following(&db_pool, &user.id).await?;

    Ok(Json(profile).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    Path(user_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(presence): State<Presence>,
    session: Session,
) -> AppResult<Response> {
    if CurrentUser::load(&session).await?.is_none() {
        return Ok(error::unauthorized());
    }

    let Some(user) = db::fetch_user(&db_pool, &user_id).await? else {
        return Ok(error::not_found("profile"));
    };

    Ok(Json(PublicProfile {
        online: presence.is_online(&user.id),
        id: user.id,
        display_name: user.display_name,
        handle: user.handle,
        avatar_url: user.avatar_url,
        summary: user.summary,
    })
    .into_response())
}
