mod bootstrap;
mod page;
mod suggest;
mod summary;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use summary::{GeminiSummarizer, GeneratorError, NoSummarizer, SummaryGenerator, FALLBACK_SUMMARY};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(bootstrap::create_profile))
        .route("/new", get(bootstrap::new_profile_page))
        .route("/me", get(page::me))
        .route("/suggest", get(suggest::suggest))
        .route("/{id}", get(page::profile))
}
