use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub upstream: UpstreamSettings,
    pub database: DatabaseSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    /// Base URL of the chat-completions backend that requests are relayed to.
    pub base_url: String,
    /// Bound on connect time and on the total duration of a buffered forward.
    pub forward_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database_name: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    /// Comma-separated list of origins allowed to call the proxy directly.
    pub allowed_origins: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8099)?
            .set_default("upstream.base_url", "http://localhost:8091")?
            .set_default("upstream.forward_timeout_seconds", 60)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "password")?
            .set_default("database.database_name", "searchtap")?
            .set_default("database.max_connections", 10)?
            .set_default(
                "cors.allowed_origins",
                "http://localhost:3000,http://127.0.0.1:3000",
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("SEARCHTAP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.username,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.database_name
        )
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.forward_timeout_seconds)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors
            .allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new().expect("Failed to load configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_can_be_loaded() {
        let settings = Settings::new();
        assert!(settings.is_ok());
    }

    #[test]
    fn test_database_url_format() {
        let settings = Settings::new().unwrap();
        let url = settings.database_url();
        assert!(url.starts_with("postgres://"));
        assert!(url.contains(&settings.database.username));
        assert!(url.contains(&settings.database.database_name));
    }

    #[test]
    fn test_allowed_origins_are_split_and_trimmed() {
        let mut settings = Settings::new().unwrap();
        settings.cors.allowed_origins = "http://a.test, http://b.test,,".to_string();
        assert_eq!(
            settings.allowed_origins(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_forward_timeout_uses_configured_seconds() {
        let mut settings = Settings::new().unwrap();
        settings.upstream.forward_timeout_seconds = 5;
        assert_eq!(settings.forward_timeout(), Duration::from_secs(5));
    }
}
