use async_trait::async_trait;
use serde_json::{json, Value};

/// What a profile says when the generator has nothing to say.
pub const FALLBACK_SUMMARY: &str = "A fascinating individual.";

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("summary generator is not configured")]
    Disabled,
    #[error("summary request failed")]
    Http(#[from] reqwest::Error),
    #[error("summary response was malformed")]
    Malformed,
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, first_name: &str, last_initial: &str)
        -> Result<String, GeneratorError>;
}

pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: String, model: String) -> GeminiSummarizer {
        GeminiSummarizer {
            http: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl SummaryGenerator for GeminiSummarizer {
    async fn generate(
        &self,
        first_name: &str,
        last_initial: &str,
    ) -> Result<String, GeneratorError> {
        let prompt = format!(
            "You are a creative writer tasked with generating short, engaging profile summaries.\n\n\
             Based on the user's first name and last initial, create a 1-2 sentence profile summary.\n\n\
             First Name: {first_name}\n\
             Last Initial: {last_initial}\n"
        );

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body: Value = self
            .http
            .post(&url)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or(GeneratorError::Malformed)?;

        Ok(text.trim().to_owned())
    }
}

/// Stand-in when no API key is configured; bootstrap falls back to
/// [`FALLBACK_SUMMARY`] instead of failing.
pub struct NoSummarizer;

#[async_trait]
impl SummaryGenerator for NoSummarizer {
    async fn generate(&self, _: &str, _: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}
