use axum::{debug_handler, response::IntoResponse, Json};
use rand::{seq::IndexedRandom, Rng};
use serde_json::json;

const ADJECTIVES: &[&str] = &[
    "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
    "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy", "Sad",
    "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Dark", "Lucky",
];

const NOUNS: &[&str] = &[
    "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
    "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
    "Unicorn", "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
];

pub(crate) fn suggest_handle() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Quick");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Fox");
    format!("{adjective}{noun}{}", rng.random_range(100..1000))
}

#[debug_handler]
pub(crate) async fn suggest() -> impl IntoResponse {
    Json(json!({ "handle": suggest_handle() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_are_plausible_handles() {
        for _ in 0..32 {
            let handle = suggest_handle();
            assert!(handle.chars().all(char::is_alphanumeric));
            assert!(handle.len() >= 6);
        }
    }
}
