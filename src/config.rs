//! Client configuration.
//!
//! Configuration is an explicit object passed at resource-set construction,
//! never ambient global state. [`ClientConfig::from_env`] resolves the base
//! URL through a three-tier fallback: `BASE_API_URL`, then `API_BASE_URL`
//! (either may come from a `.env` file), then a fixed localhost default
//! suitable for test servers.

use chrono_tz::Tz;
use log::{debug, warn};

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIME_ZONE};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every model resource URL is built from, trailing slash
    /// included, e.g. `http://localhost:8001/api/`.
    pub base_url: String,
    /// Timezone that naive datetime fields are anchored to.
    pub timezone: Tz,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timezone: default_timezone(),
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Build a configuration from the environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = resolve_base_url();
        let timezone = resolve_timezone();
        debug!("client config: base_url={} timezone={}", base_url, timezone);

        Self { base_url, timezone }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Three-tier base URL resolution: `BASE_API_URL`, `API_BASE_URL`, then the
/// localhost test default.
fn resolve_base_url() -> String {
    std::env::var("BASE_API_URL")
        .or_else(|_| std::env::var("API_BASE_URL"))
        .unwrap_or_else(|_| {
            debug!("no base URL in environment, using {}", DEFAULT_BASE_URL);
            DEFAULT_BASE_URL.to_string()
        })
}

fn resolve_timezone() -> Tz {
    match std::env::var("TIME_ZONE") {
        Ok(name) => name.parse().unwrap_or_else(|_| {
            warn!("unknown TIME_ZONE {:?}, using {}", name, DEFAULT_TIME_ZONE);
            default_timezone()
        }),
        Err(_) => default_timezone(),
    }
}

fn default_timezone() -> Tz {
    DEFAULT_TIME_ZONE
        .parse()
        .unwrap_or(chrono_tz::Europe::London)
}
