use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};

/// Default backend origin; matches the chat server's development bind.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend connection settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Origin the `/chat` path is appended to.
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerSettings {
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            self.base_url = DEFAULT_BASE_URL.to_string();
        }
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Read-only settings loader. There is no settings UI, so nothing ever
/// writes this file back; users edit it by hand.
pub struct SettingsStore;

impl SettingsStore {
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(".parley").join("settings.json")
    }

    pub fn load() -> ServerSettings {
        Self::load_from(&Self::default_config_path())
    }

    fn load_from(path: &PathBuf) -> ServerSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
            return ServerSettings::default();
        }

        let figment = Figment::from(Serialized::defaults(ServerSettings::default()))
            .merge(Json::file(path));

        match figment.extract::<ServerSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                ServerSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_development_backend() {
        let settings = ServerSettings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_settings_files_merge_over_defaults() {
        let figment = Figment::from(Serialized::defaults(ServerSettings::default()))
            .merge(Json::string(r#"{"base_url": "https://bot.example.com/"}"#));

        let settings = figment.extract::<ServerSettings>().unwrap().normalized();
        assert_eq!(settings.base_url, "https://bot.example.com");
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn normalization_repairs_degenerate_values() {
        let settings = ServerSettings {
            base_url: "   ".to_string(),
            request_timeout_secs: 0,
        }
        .normalized();

        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.request_timeout_secs, 1);
    }
}
