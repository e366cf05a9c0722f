use tower_sessions::Session;

use crate::{auth::Identity, AppResult};

pub const USER_ID: &str = "user_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";
pub const PENDING_IDENTITY: &str = "pending_identity";

/// The signed-in principal for this session. Constructed by the OAuth
/// callback, gone after logout.
pub struct CurrentUser {
    pub id: String,
}

impl CurrentUser {
    pub async fn load(session: &Session) -> AppResult<Option<CurrentUser>> {
        Ok(session
            .get::<String>(USER_ID)
            .await?
            .map(|id| CurrentUser { id }))
    }
}

/// The authenticated identity that has not been through profile bootstrap
/// yet. Stashed by the OAuth callback so the bootstrap request can read it
/// back without re-contacting the provider.
pub async fn pending_identity(session: &Session) -> AppResult<Option<Identity>> {
    Ok(session.get::<Identity>(PENDING_IDENTITY).await?)
}
