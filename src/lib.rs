pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod presence;
pub mod profiles;
pub mod session;
pub mod users;

use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::FromRef;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

pub use config::{Config, SelfFollowPolicy};
pub use error::{ApiError, AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub clients: auth::Clients,
    pub presence: presence::Presence,
    pub chat_tx: broadcast::Sender<chat::ChatEvent>,
    pub summarizer: Arc<dyn profiles::SummaryGenerator>,
    pub self_follow: SelfFollowPolicy,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(self
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("expected string field {field} in payload"))?
            .to_owned())
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
            .ok_or_else(|| anyhow!("expected field {field} in payload").into())
    }
}

pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
