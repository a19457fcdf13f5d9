//! Persistence configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Supabase persistence configuration.
///
/// Both fields empty selects the in-memory store, which loses history on
/// restart but needs no external service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Supabase project URL.
    pub supabase_url: Option<String>,

    /// Supabase API key.
    pub supabase_key: Option<String>,
}

impl DatabaseConfig {
    /// True when Supabase persistence is configured.
    pub fn has_supabase(&self) -> bool {
        self.supabase_url.as_ref().is_some_and(|u| !u.is_empty())
            && self.supabase_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validates the database section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url_set = self.supabase_url.as_ref().is_some_and(|u| !u.is_empty());
        let key_set = self.supabase_key.as_ref().is_some_and(|k| !k.is_empty());
        if url_set != key_set {
            return Err(ValidationError::InvalidValue {
                field: "database",
                reason: "supabase_url and supabase_key must be set together".to_string(),
            });
        }
        if let Some(url) = &self.supabase_url {
            if url_set && !url.starts_with("https://") {
                return Err(ValidationError::InvalidValue {
                    field: "database.supabase_url",
                    reason: "must be an https:// URL".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_selects_in_memory_store() {
        let config = DatabaseConfig::default();
        assert!(!config.has_supabase());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_without_key_fails_validation() {
        let config = DatabaseConfig {
            supabase_url: Some("https://xyz.supabase.co".to_string()),
            supabase_key: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn plain_http_url_fails_validation() {
        let config = DatabaseConfig {
            supabase_url: Some("http://xyz.supabase.co".to_string()),
            supabase_key: Some("key".to_string()),
        };
        assert!(config.validate().is_err());
    }
}
