//! Application configuration.
//!
//! Type-safe configuration loaded from environment variables with the
//! `CODEQUEST` prefix; nested values use `__` as the separator, so
//! `CODEQUEST__SERVER__PORT=8000` sets `server.port`.

mod ai;
mod catalog;
mod database;
mod error;
mod server;

pub use ai::AiConfig;
pub use catalog::CatalogConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment).
    #[serde(default)]
    pub server: ServerConfig,

    /// AI provider configuration (Gemini).
    #[serde(default)]
    pub ai: AiConfig,

    /// Persistence configuration (Supabase, optional).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Problem catalog configuration (LeetCode).
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads a `.env` file when present, then environment variables with the
    /// `CODEQUEST` prefix and `__` separating nested keys.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CODEQUEST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.database.validate()?;
        self.catalog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("CODEQUEST__AI__GEMINI_API_KEY");
        env::remove_var("CODEQUEST__SERVER__PORT");
        env::remove_var("CODEQUEST__DATABASE__SUPABASE_URL");
        env::remove_var("CODEQUEST__DATABASE__SUPABASE_KEY");
    }

    #[test]
    fn loads_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CODEQUEST__AI__GEMINI_API_KEY", "test-key");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.catalog.base_url, "https://leetcode.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_port_overrides_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CODEQUEST__AI__GEMINI_API_KEY", "test-key");
        env::set_var("CODEQUEST__SERVER__PORT", "3000");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(result.unwrap().server.port, 3000);
    }

    #[test]
    fn validation_fails_without_api_key() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }
}
