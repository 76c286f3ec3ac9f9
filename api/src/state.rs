use std::time::Duration;

use pixela_core::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, PixelaClient, PixelaError};

#[derive(Clone)]
pub struct AppState {
    /// Shared by every request; holds the connection pool, never credentials.
    pub client: PixelaClient,
}

impl AppState {
    pub fn new(client: PixelaClient) -> Self {
        Self { client }
    }

    /// Reads `PIXELA_BASE_URL` and `PIXELA_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, PixelaError> {
        let config = client_config(
            std::env::var("PIXELA_BASE_URL").ok(),
            std::env::var("PIXELA_HTTP_TIMEOUT_SECS").ok(),
        );
        tracing::info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            "pixela client configured"
        );
        PixelaClient::new(&config).map(Self::new)
    }
}

fn client_config(base_url: Option<String>, timeout_secs: Option<String>) -> ClientConfig {
    let base_url = base_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout_secs = timeout_secs
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    ClientConfig {
        timeout: Duration::from_secs(timeout_secs),
        ..ClientConfig::with_base_url(base_url)
    }
}
