#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub public_url: String,
    pub client_secret_path: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub self_follow: SelfFollowPolicy,
}

/// Whether follow(a, a) writes an edge or is silently dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelfFollowPolicy {
    Allow,
    #[default]
    Ignore,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            database_url: dotenv::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:nexus.db?mode=rwc".to_owned()),
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            public_url: dotenv::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_owned()),
            client_secret_path: dotenv::var("CLIENT_SECRET_PATH")
                .unwrap_or_else(|_| "client_secret.json".to_owned()),
            gemini_api_key: dotenv::var("GEMINI_API_KEY").ok(),
            gemini_model: dotenv::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_owned()),
            self_follow: match dotenv::var("SELF_FOLLOW").as_deref() {
                Ok("allow") => SelfFollowPolicy::Allow,
                _ => SelfFollowPolicy::Ignore,
            },
        }
    }
}
