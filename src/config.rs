/// Client configuration, overridable through the environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Backend origin, without a trailing slash.
    pub server_url: String,
    /// `tracing-subscriber` filter directive.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let server_url = lookup("DOCQA_SERVER_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(default.server_url);
        let log_filter = lookup("DOCQA_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(default.log_filter);

        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            log_filter,
        }
    }
}
