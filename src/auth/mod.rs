use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

mod clients;
mod lockin;
mod login;
mod logout;

pub use clients::{ClientProvider, Clients};

/// What the authentication provider vouches for. Everything the app knows
/// about a person before bootstrap comes from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page))
        .route("/login/{provider}", get(login::login))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}
