use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    auth::Identity,
    db::AppUser,
    error::classify_store_error,
    now_millis,
    session::pending_identity,
    ApiError, AppResult, AppState,
};

use super::{suggest, SummaryGenerator, FALLBACK_SUMMARY};

/// Turns a freshly authenticated identity into a durable user with a
/// uniquely reserved handle. The reservation and the user row are written
/// in one transaction; there is no observable state where only one exists.
pub(crate) async fn bootstrap_profile(
    db_pool: &SqlitePool,
    generator: &dyn SummaryGenerator,
    identity: &Identity,
    requested_handle: &str,
) -> Result<AppUser, ApiError> {
    if identity.display_name.trim().is_empty()
        || identity.email.trim().is_empty()
        || identity.avatar_url.trim().is_empty()
    {
        return Err(ApiError::IncompleteIdentity);
    }

    let (first_name, last_initial) = summary_inputs(&identity.display_name);
    let summary = match generator
        .generate(&first_name, &last_initial.to_uppercase())
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.trim().to_owned(),
        Ok(_) => FALLBACK_SUMMARY.to_owned(),
        Err(err) => {
            tracing::debug!(error = %err, "summary generator unavailable, using fallback");
            FALLBACK_SUMMARY.to_owned()
        }
    };

    let user = AppUser {
        id: identity.subject.clone(),
        display_name: identity.display_name.clone(),
        email: identity.email.clone(),
        avatar_url: identity.avatar_url.clone(),
        handle: requested_handle.to_owned(),
        summary,
        created_at: now_millis(),
        following: Vec::new(),
    };

    let mut tx = db_pool.begin().await.map_err(ApiError::Backend)?;

    sqlx::query("INSERT INTO handles (handle_key, user_id) VALUES (?,?)")
        .bind(requested_handle.to_lowercase())
        .bind(&user.id)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            classify_store_error(err, || ApiError::HandleTaken(requested_handle.to_owned()))
        })?;

    sqlx::query(
        "INSERT INTO users (id, display_name, email, avatar_url, handle, summary, created_at) \
         VALUES (?,?,?,?,?,?,?)",
    )
    .bind(&user.id)
    .bind(&user.display_name)
    .bind(&user.email)
    .bind(&user.avatar_url)
    .bind(&user.handle)
    .bind(&user.summary)
    .bind(user.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|err| classify_store_error(err, || ApiError::ProfileExists))?;

    tx.commit().await.map_err(ApiError::Backend)?;

    tracing::info!(subject = %user.id, handle = %user.handle, "bootstrapped profile");

    Ok(user)
}

/// Best-effort cosmetic input for the summary generator; never fails the
/// bootstrap. Single-token names fall back to their second character.
fn summary_inputs(display_name: &str) -> (String, String) {
    let mut tokens = display_name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_owned();
    let last_initial = tokens
        .next_back()
        .map(|last| last.chars().next())
        .unwrap_or_else(|| first.chars().nth(1));
    (first, last_initial.map(String::from).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateProfileForm {
    handle: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_profile(
    State(db_pool): State<SqlitePool>,
    State(summarizer): State<Arc<dyn SummaryGenerator>>,
    session: Session,
    Json(CreateProfileForm { handle }): Json<CreateProfileForm>,
) -> AppResult<Response> {
    let Some(identity) = pending_identity(&session).await? else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "sign in before creating a profile" })),
        )
            .into_response());
    };

    let handle = handle.trim().to_owned();
    if handle.is_empty() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "choose a handle", "field": "handle" })),
        )
            .into_response());
    }

    match bootstrap_profile(&db_pool, summarizer.as_ref(), &identity, &handle).await {
        Ok(user) => Ok(Json(user).into_response()),
        Err(err) => Ok(err.into_response()),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_profile_page(session: Session) -> AppResult<Response> {
    let Some(identity) = pending_identity(&session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    Ok(Json(json!({
        "display_name": identity.display_name,
        "email": identity.email,
        "avatar_url": identity.avatar_url,
        "suggested_handle": suggest::suggest_handle(),
    }))
    .into_response())
}
