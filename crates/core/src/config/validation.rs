//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `origin` is not an absolute http(s) URL
    /// - a name or path field is empty or not rooted at `/`
    /// - `image_cache_max_items` is 0
    ///
    /// Returns `ConfigError::Missing` if the manifest or the image extension list is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.has_host() => {}
            Ok(_) => return Err(invalid("origin", "must be an http(s) URL with a host")),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        if self.cache_prefix.is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }
        if self.cache_version.is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        for (field, path) in [
            ("app_shell_page", &self.app_shell_page),
            ("offline_page", &self.offline_page),
            ("placeholder_image", &self.placeholder_image),
            ("data_file", &self.data_file),
            ("api_prefix", &self.api_prefix),
            ("images_prefix", &self.images_prefix),
        ] {
            if !path.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if self.precache_urls.is_empty() {
            return Err(ConfigError::Missing {
                field: "precache_urls".into(),
                hint: "list the application shell paths to fetch at install".into(),
            });
        }

        if self.image_extensions.is_empty() {
            return Err(ConfigError::Missing {
                field: "image_extensions".into(),
                hint: "e.g. [\"png\", \"jpg\"]".into(),
            });
        }
        if let Some(bad) =
            self.image_extensions.iter().find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(invalid("image_extensions", &format!("not a plain extension: {bad:?}")));
        }

        if self.image_cache_max_items == 0 {
            return Err(invalid("image_cache_max_items", "must be at least 1"));
        }

        for (field, path) in [("offline_page", &self.offline_page), ("placeholder_image", &self.placeholder_image)] {
            if !self.precache_urls.contains(path) {
                tracing::warn!(field, path = %path, "fallback asset is not precached; it will only be served once fetched");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() }; // 5min 1sec
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));

        let config = AppConfig { origin: "file:///srv/app".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_relative_path() {
        let config = AppConfig { offline_page: "offline.html".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "offline_page"));
    }

    #[test]
    fn test_validate_empty_manifest() {
        let config = AppConfig { precache_urls: Vec::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "precache_urls"));
    }

    #[test]
    fn test_validate_image_extensions() {
        let config = AppConfig { image_extensions: vec!["png".into(), "j.pg".into()], ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "image_extensions"));
    }

    #[test]
    fn test_validate_zero_ceiling() {
        let config = AppConfig { image_cache_max_items: 0, ..Default::default() };
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "image_cache_max_items")
        );
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, image_cache_max_items: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
