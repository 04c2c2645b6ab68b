//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LARDER_*)
//! 2. TOML config file (if LARDER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LARDER_*)
/// 2. TOML config file (if LARDER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store database.
    ///
    /// Set via LARDER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the application. Manifest paths and notification targets
    /// are resolved against it.
    ///
    /// Set via LARDER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes read from one network response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Prefix shared by the store names of every version.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version suffix. Changing it purges the previous version's stores on activation.
    ///
    /// Set via LARDER_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Application shell fetched at install, in order.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Precache key refreshed by every successful navigation.
    #[serde(default = "default_app_shell_page")]
    pub app_shell_page: String,

    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    /// Path suffix routed to the dynamic-data strategy.
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Path prefix routed to the dynamic-data strategy.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Path prefix routed to the image strategy.
    #[serde(default = "default_images_prefix")]
    pub images_prefix: String,

    /// File extensions routed to the image strategy.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Entry ceiling of the runtime store after image writes.
    ///
    /// Set via LARDER_IMAGE_CACHE_MAX_ITEMS environment variable.
    #[serde(default = "default_image_cache_max_items")]
    pub image_cache_max_items: usize,

    /// Activate a freshly installed version without waiting for the old one to let go.
    #[serde(default)]
    pub skip_waiting_on_install: bool,

    /// Push notification defaults.
    ///
    /// Set via LARDER_NOTIFICATION__TITLE and friends.
    #[serde(default)]
    pub notification: NotificationDefaults,
}

/// Values used for fields a push payload leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "Simple Recipe Book".into(),
            body: "New recipe available!".into(),
            url: "/".into(),
            icon: Some("/icons/icon-192.png".into()),
            badge: Some("/icons/icon-192.png".into()),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./larder-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "larder/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_cache_prefix() -> String {
    "simple-recipe-book".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/style.css",
        "/script.js",
        "/manifest.json",
        "/recipes.json",
        "/images/placeholder.png",
        "/icons/icon-192.png",
        "/icons/icon-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_app_shell_page() -> String {
    "/index.html".into()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_placeholder_image() -> String {
    "/images/placeholder.png".into()
}

fn default_data_file() -> String {
    "/recipes.json".into()
}

fn default_api_prefix() -> String {
    "/api/recipes".into()
}

fn default_images_prefix() -> String {
    "/images/".into()
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp", "svg"].into_iter().map(String::from).collect()
}

fn default_image_cache_max_items() -> usize {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            app_shell_page: default_app_shell_page(),
            offline_page: default_offline_page(),
            placeholder_image: default_placeholder_image(),
            data_file: default_data_file(),
            api_prefix: default_api_prefix(),
            images_prefix: default_images_prefix(),
            image_extensions: default_image_extensions(),
            image_cache_max_items: default_image_cache_max_items(),
            skip_waiting_on_install: false,
            notification: NotificationDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of this version's precache store.
    pub fn precache_name(&self) -> String {
        format!("{}-precache-{}", self.cache_prefix, self.cache_version)
    }

    /// Name of this version's runtime store.
    pub fn runtime_name(&self) -> String {
        format!("{}-runtime-{}", self.cache_prefix, self.cache_version)
    }

    /// Stores that survive activation of this version.
    pub fn known_good_stores(&self) -> Vec<String> {
        vec![self.precache_name(), self.runtime_name()]
    }

    /// Same configuration at a different version.
    pub fn with_version(&self, version: &str) -> Self {
        Self { cache_version: version.to_string(), ..self.clone() }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LARDER_`
    /// 2. TOML file from `LARDER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LARDER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("LARDER_").map(|key| key.as_str().to_lowercase().into()).split("__"));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
