use std::{fs, str::FromStr, sync::Arc};

use axum::{
    debug_handler,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use nexus_connect::{
    auth, chat, db,
    presence::Presence,
    profiles::{self, GeminiSummarizer, NoSummarizer, SummaryGenerator},
    session::CurrentUser,
    users, AppResult, AppState, Config,
};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await?;
    db::init(&db_pool).await?;

    let secrets = serde_json::Value::from_str(&fs::read_to_string(&config.client_secret_path)?)?;
    let clients = auth::Clients::from_json(&secrets, &config.public_url)
        .map_err(|err| anyhow::anyhow!("bad client secrets: {}", err.0))?;

    let summarizer: Arc<dyn SummaryGenerator> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiSummarizer::new(key.clone(), config.gemini_model.clone())),
        None => {
            tracing::warn!("GEMINI_API_KEY not set, profile summaries fall back to a fixed line");
            Arc::new(NoSummarizer)
        }
    };

    let app_state = AppState {
        db_pool,
        clients,
        presence: Presence::new(),
        chat_tx: broadcast::channel(64).0,
        summarizer,
        self_follow: config.self_follow,
    };

    let app = Router::new()
        .route("/", get(index))

        .merge(auth::router())
        .nest("/p", profiles::router())
        .nest("/u", users::router())
        .nest("/presence", nexus_connect::presence::router())
        .nest("/c", chat::router())

        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[debug_handler]
async fn index(session: Session) -> AppResult<Response> {
    if let Some(user) = CurrentUser::load(&session).await? {
        Ok(Json(json!({ "signed_in": true, "user_id": user.id })).into_response())
    } else {
        Ok(Redirect::to("/login").into_response())
    }
}
