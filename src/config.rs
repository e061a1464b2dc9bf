use crate::batcher::DEFAULT_QUIESCENCE;
use crate::event::Screen;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::time::Duration;
use tracing::warn;

pub const DEFAULT_EVENTS_ENDPOINT: &str = "http://localhost:5000/api/events";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const ACCESS_TOKEN_ENV: &str = "APP_EVENTS_ACCESS_TOKEN";
pub const ENDPOINT_ENV: &str = "APP_EVENTS_ENDPOINT";
pub const API_KEY_ENV: &str = "APP_EVENTS_API_KEY";

#[derive(Debug, Deserialize, Default)]
pub struct AppEventsConfig {
    pub events: Option<EventsConfig>,
    pub api: Option<ApiConfig>,
    pub screen: Option<ScreenConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EventsConfig {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub quiescence_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ScreenConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug)]
pub struct ResolvedSettings {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub quiescence: Duration,
    pub screen: Screen,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub warnings: Vec<String>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("app-events").join("config.toml"))
}

pub fn load_config(path: &Path) -> Option<AppEventsConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read config file");
            }
            return None;
        }
    };

    match toml::from_str::<AppEventsConfig>(&raw) {
        Ok(config) => Some(config),
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse config file");
            None
        }
    }
}

pub fn resolve_settings<F>(config: Option<&AppEventsConfig>, env: F) -> ResolvedSettings
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();
    let events = config.and_then(|c| c.events.as_ref());
    let api = config.and_then(|c| c.api.as_ref());
    let screen = config.and_then(|c| c.screen.as_ref());

    let endpoint = match non_empty(env(ENDPOINT_ENV))
        .or_else(|| non_empty(events.and_then(|e| e.endpoint.clone())))
    {
        Some(endpoint) => endpoint,
        None => {
            if events.and_then(|e| e.endpoint.as_ref()).is_some() {
                warnings.push(format!(
                    "Config [events].endpoint is empty; using {}.",
                    DEFAULT_EVENTS_ENDPOINT
                ));
            }
            DEFAULT_EVENTS_ENDPOINT.to_string()
        }
    };

    let access_token = env(ACCESS_TOKEN_ENV).or_else(|| events.and_then(|e| e.access_token.clone()));

    let quiescence = match events.and_then(|e| e.quiescence_ms) {
        Some(0) => {
            warnings.push(format!(
                "Config [events].quiescence_ms must be positive; using {}.",
                DEFAULT_QUIESCENCE.as_millis()
            ));
            DEFAULT_QUIESCENCE
        }
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_QUIESCENCE,
    };

    let screen = Screen::new(
        screen.and_then(|s| s.width).unwrap_or_default(),
        screen.and_then(|s| s.height).unwrap_or_default(),
    );

    let api_base_url = non_empty(api.and_then(|a| a.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let api_key = env(API_KEY_ENV).or_else(|| api.and_then(|a| a.api_key.clone()));

    ResolvedSettings {
        endpoint,
        access_token,
        quiescence,
        screen,
        api_base_url,
        api_key,
        warnings,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
