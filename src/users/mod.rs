mod follow;
mod list;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users))
        .route("/{id}/follow", post(follow::follow_user))
        .route("/{id}/unfollow", post(follow::unfollow_user))
}
