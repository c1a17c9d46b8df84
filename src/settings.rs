use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL of the remote document store, e.g. `https://store.example.com/v1`.
    #[serde(default)]
    pub store_url: String,

    /// Base URL of the blob store holding profile images.
    #[serde(default)]
    pub storage_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// How often live-sync watches re-read remote state, humantime format.
    #[serde(default = "default_watch_poll_interval")]
    pub watch_poll_interval: String,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "profile-sync".to_string()
}
fn default_watch_poll_interval() -> String {
    "2s".to_string()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name.to_string().to_lowercase())).required(false))
            .add_source(Environment::with_prefix("APP").separator("_").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Inject critical env values if missing
        config.store_url = fill_or_env(config.store_url, "APP_STORE_URL")?;
        config.storage_url = fill_or_env(config.storage_url, "APP_STORAGE_URL")?;

        if config.api_key.is_none() {
            config.api_key = env::var("APP_API_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if Url::parse(&self.store_url).is_err() {
            errors.push(format!("store_url is not a valid URL: {}", self.store_url));
        }
        if Url::parse(&self.storage_url).is_err() {
            errors.push(format!("storage_url is not a valid URL: {}", self.storage_url));
        }
        if humantime::parse_duration(&self.watch_poll_interval).is_err() {
            errors.push(format!(
                "watch_poll_interval is not a valid duration: {}",
                self.watch_poll_interval
            ));
        }
        if self.is_production() && self.api_key.is_none() {
            errors.push("api_key must be set in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn poll_interval(&self) -> Duration {
        humantime::parse_duration(&self.watch_poll_interval)
            .unwrap_or_else(|_| Duration::from_secs(2))
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("store_url", &self.store_url)
            .field("storage_url", &self.storage_url)
            .field(
                "api_key",
                &self.api_key.as_deref().unwrap_or_default().redact(),
            )
            .field("watch_poll_interval", &self.watch_poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "profile-sync".to_string(),
            store_url: "http://localhost:9099/v1".to_string(),
            storage_url: "http://localhost:9199".to_string(),
            api_key: None,
            watch_poll_interval: "2s".to_string(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn bad_store_url_fails() {
        let mut config = base_config();
        config.store_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_requires_api_key() {
        let mut config = base_config();
        config.env = AppEnvironment::Production;
        assert!(config.validate().is_err());
    }

    #[test]
    fn poll_interval_parses_humantime() {
        let mut config = base_config();
        config.watch_poll_interval = "500ms".to_string();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }
}
