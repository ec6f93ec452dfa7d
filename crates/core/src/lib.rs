pub mod analysis;
pub mod assembler;
pub mod cache;
pub mod domain;
pub mod ingest;
pub mod market;
pub mod time;

pub mod config {
    use anyhow::Context;

    const DEFAULT_METALS_API_BASE_URL: &str = "https://api.metals.dev";
    const DEFAULT_EXCHANGE_RATE_API_BASE_URL: &str = "https://v6.exchangerate-api.com";
    const DEFAULT_EXCHANGE_RATE_FALLBACK_URL: &str = "https://api.exchangerate.host";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub metals_api_key: Option<String>,
        pub metals_api_base_url: String,
        pub exchange_rate_api_key: Option<String>,
        pub exchange_rate_api_base_url: String,
        pub exchange_rate_fallback_url: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                metals_api_key: non_empty_var("METALS_API_KEY"),
                metals_api_base_url: non_empty_var("METALS_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_METALS_API_BASE_URL.to_string()),
                exchange_rate_api_key: non_empty_var("EXCHANGE_RATE_API_KEY"),
                exchange_rate_api_base_url: non_empty_var("EXCHANGE_RATE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_API_BASE_URL.to_string()),
                exchange_rate_fallback_url: non_empty_var("EXCHANGE_RATE_FALLBACK_URL")
                    .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_FALLBACK_URL.to_string()),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_metals_api_key(&self) -> anyhow::Result<&str> {
            self.metals_api_key
                .as_deref()
                .context("METALS_API_KEY is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}
