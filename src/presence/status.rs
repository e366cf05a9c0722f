use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use tower_sessions::Session;

use crate::{error, session::CurrentUser, AppResult, AppState};

use super::Presence;

#[debug_handler(state = AppState)]
pub(crate) async fn status(
    Path(user_id): Path<String>,
    State(presence): State<Presence>,
    session: Session,
) -> AppResult<Response> {
    if CurrentUser::load(&session).await?.is_none() {
        return Ok(error::unauthorized());
    }

    Ok(Json(presence.snapshot(&user_id)).into_response())
}
