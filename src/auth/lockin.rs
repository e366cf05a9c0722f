use anyhow::anyhow;
use axum::{debug_handler, extract::{Path, Query, State}, response::{IntoResponse, Redirect}};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, session::{CSRF_STATE, PENDING_IDENTITY, PKCE_VERIFIER, RETURN_URL, USER_ID}, AppResult, AppState, GetField};

use super::{clients::ClientProvider, Clients, Identity};

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Path(provider): Path<ClientProvider>,
    Query(LockinQuery { state, code }): Query<LockinQuery>,
    State(db_pool): State<SqlitePool>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    let state = CsrfToken::new(state.ok_or_else(|| anyhow!("OAuth: without state"))?);
    let code = AuthorizationCode::new(code.ok_or_else(|| anyhow!("OAuth: without code"))?);

    let Some(stored_state) = session.get::<String>(CSRF_STATE).await? else {
        return Err(anyhow!("no csrf_state"))?;
    };

    if state.secret().as_str() != stored_state.as_str() {
        return Err(anyhow!("csrf tokens don't match"))?;
    }

    let Some(pkce_verifier) = session.get::<String>(PKCE_VERIFIER).await? else {
        return Err(anyhow!("no pkce_verifier"))?;
    };

    let client = clients.get_client(provider)?;
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    let access_token = token_result.access_token().secret();
    let body: Value = http_client
        .get(provider.userinfo_url())
        .bearer_auth(access_token)
        .header(reqwest::header::USER_AGENT, "nexus-connect")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let identity = identity_from_userinfo(provider, &body)?;
    session.insert(USER_ID, &identity.subject).await?;
    session.insert(PENDING_IDENTITY, &identity).await?;

    tracing::info!(subject = %identity.subject, "signed in");

    let return_url: Option<String> = session.get(RETURN_URL).await?;

    // Existing users go back to where they came from; fresh identities
    // still have to pick a handle.
    if db::user_exists(&db_pool, &identity.subject).await? {
        Ok(Redirect::to(return_url.unwrap_or("/".to_string()).as_str()))
    } else {
        Ok(Redirect::to("/p/new"))
    }
}

/// Missing claims become empty strings here; bootstrap is the place that
/// rejects incomplete identities, before anything is written.
fn identity_from_userinfo(provider: ClientProvider, body: &Value) -> AppResult<Identity> {
    let subject = match provider {
        ClientProvider::Google => body.get_str_field("sub")?,
        ClientProvider::Github => body
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow!("expected numeric id from github"))?
            .to_string(),
    };

    let (name_field, avatar_field) = match provider {
        ClientProvider::Google => ("name", "picture"),
        ClientProvider::Github => ("name", "avatar_url"),
    };

    Ok(Identity {
        subject: format!("{}:{}", provider.namespace(), subject),
        display_name: str_or_empty(body, name_field),
        email: str_or_empty(body, "email"),
        avatar_url: str_or_empty(body, avatar_field),
    })
}

fn str_or_empty(body: &Value, field: &str) -> String {
    body.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn google_userinfo_maps_to_identity() {
        let body = json!({
            "sub": "108",
            "name": "Jane Doe",
            "email": "jane@x.com",
            "picture": "https://lh3.example/jane",
        });
        let identity = identity_from_userinfo(ClientProvider::Google, &body).unwrap();
        assert_eq!(identity.subject, "google:108");
        assert_eq!(identity.display_name, "Jane Doe");
        assert_eq!(identity.email, "jane@x.com");
        assert_eq!(identity.avatar_url, "https://lh3.example/jane");
    }

    #[test]
    fn github_nulls_become_empty_not_errors() {
        let body = json!({
            "id": 4242,
            "name": null,
            "email": null,
            "avatar_url": "https://avatars.example/4242",
        });
        let identity = identity_from_userinfo(ClientProvider::Github, &body).unwrap();
        assert_eq!(identity.subject, "github:4242");
        assert_eq!(identity.display_name, "");
        assert_eq!(identity.email, "");
    }
}
