use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const MIN_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_CONFIG_STALE_SECS: u64 = 120;
const DEFAULT_OVERVIEW_STALE_SECS: u64 = 300;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppProfile {
    Dev,
    Prod,
}

impl AppProfile {
    pub fn from_env(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("prod") | Some("production") => Self::Prod,
            _ => Self::Dev,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub profile: AppProfile,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
    pub config_stale_after: Duration,
    pub overview_stale_after: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            profile: AppProfile::Dev,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(MIN_SEARCH_DEBOUNCE_MS),
            config_stale_after: Duration::from_secs(DEFAULT_CONFIG_STALE_SECS),
            overview_stale_after: Duration::from_secs(DEFAULT_OVERVIEW_STALE_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        crate::config::load_dotenv();

        Self::from_lookup(read_env)
    }

    fn from_lookup(read: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = read("FEEDBACK_API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }

        config.auth_token = read("FEEDBACK_AUTH_TOKEN").filter(|token| !token.trim().is_empty());
        config.profile = AppProfile::from_env(read("FEEDBACK_PROFILE"));

        if let Some(secs) = read_u64(&read, "FEEDBACK_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(ms) = read_u64(&read, "FEEDBACK_SEARCH_DEBOUNCE_MS") {
            config.search_debounce = Duration::from_millis(ms.max(MIN_SEARCH_DEBOUNCE_MS));
        }

        if let Some(secs) = read_u64(&read, "FEEDBACK_CONFIG_STALE_SECS") {
            config.config_stale_after = Duration::from_secs(secs);
        }

        if let Some(secs) = read_u64(&read, "FEEDBACK_OVERVIEW_STALE_SECS") {
            config.overview_stale_after = Duration::from_secs(secs);
        }

        config
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.auth_token
            .as_ref()
            .map(|token| format!("Bearer {}", token.trim()))
    }

    pub fn is_prod(&self) -> bool {
        self.profile == AppProfile::Prod
    }

    pub fn debounce_millis(&self) -> u32 {
        u32::try_from(self.search_debounce.as_millis()).unwrap_or(u32::MAX)
    }
}

/// 把标准库时长换算成 `time` 的时长，溢出时取上限。
pub fn staleness_window(duration: Duration) -> time::Duration {
    time::Duration::try_from(duration).unwrap_or(time::Duration::MAX)
}

fn read_u64(read: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    read(key).and_then(|value| value.trim().parse::<u64>().ok())
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .or_else(|| option_env_from_build(key).map(|s| s.to_string()))
}

fn option_env_from_build(key: &str) -> Option<&'static str> {
    match key {
        "FEEDBACK_API_BASE_URL" => option_env!("FEEDBACK_API_BASE_URL"),
        "FEEDBACK_AUTH_TOKEN" => option_env!("FEEDBACK_AUTH_TOKEN"),
        "FEEDBACK_PROFILE" => option_env!("FEEDBACK_PROFILE"),
        "FEEDBACK_REQUEST_TIMEOUT_SECS" => option_env!("FEEDBACK_REQUEST_TIMEOUT_SECS"),
        "FEEDBACK_SEARCH_DEBOUNCE_MS" => option_env!("FEEDBACK_SEARCH_DEBOUNCE_MS"),
        "FEEDBACK_CONFIG_STALE_SECS" => option_env!("FEEDBACK_CONFIG_STALE_SECS"),
        "FEEDBACK_OVERVIEW_STALE_SECS" => option_env!("FEEDBACK_OVERVIEW_STALE_SECS"),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("failed to load .env: {err}");
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[inline]
pub fn load_dotenv() {}
