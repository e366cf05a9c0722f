mod msg;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use msg::ChatEvent;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{peer}", get(msg::history))
        .route("/{peer}/ws", get(ws::chat_ws))
}

/// Both participants derive the same channel id without coordinating:
/// the pair sorted lexicographically, joined with a dash.
pub fn chat_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}-{hi}")
}

#[cfg(test)]
mod tests {
    use super::chat_id;

    #[test]
    fn chat_id_is_order_independent() {
        assert_eq!(chat_id("google:jane", "github:bob"), chat_id("github:bob", "google:jane"));
    }

    #[test]
    fn chat_id_sorts_lexicographically() {
        assert_eq!(chat_id("b", "a"), "a-b");
        assert_eq!(chat_id("a", "a"), "a-a");
    }
}
