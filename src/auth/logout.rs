use axum::{debug_handler, extract::{Query, State}, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{presence::Presence, session::CurrentUser, AppResult, AppState};

#[derive(Deserialize)]
pub(crate) struct LogoutQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn logout(
    Query(LogoutQuery { return_url }): Query<LogoutQuery>,
    State(presence): State<Presence>,
    session: Session,
) -> AppResult<Redirect> {
    // A clean sign-out does not wait for disconnect detection.
    if let Some(user) = CurrentUser::load(&session).await? {
        presence.sign_out(&user.id);
    }
    session.clear().await;
    Ok(Redirect::to(return_url.unwrap_or("/".to_string()).as_str()))
}
