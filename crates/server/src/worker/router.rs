//! Request classification.
//!
//! Purely syntactic: method, mode and URL path, checked in a fixed order.
//! First match wins.

use larder_core::{AppConfig, Error, Request};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which strategy handles an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Navigation,
    DynamicData,
    Image,
    Default,
}

/// Path rules for the dynamic-data and image routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    data_file: String,
    api_prefix: String,
    images_prefix: String,
    image_pattern: Regex,
}

impl RouteTable {
    pub fn new(
        data_file: &str, api_prefix: &str, images_prefix: &str, extensions: &[String],
    ) -> Result<Self, regex::Error> {
        let alternatives = extensions.iter().map(|ext| regex::escape(ext)).collect::<Vec<_>>().join("|");
        let image_pattern = Regex::new(&format!(r"\.({alternatives})$"))?;

        Ok(Self {
            data_file: data_file.to_string(),
            api_prefix: api_prefix.to_string(),
            images_prefix: images_prefix.to_string(),
            image_pattern,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.data_file, &config.api_prefix, &config.images_prefix, &config.image_extensions)
            .map_err(|e| Error::InvalidInput(format!("image_extensions: {e}")))
    }

    /// Strategy for `request`, or `None` when it must not be intercepted.
    pub fn classify(&self, request: &Request) -> Option<RequestKind> {
        if !request.is_get() {
            return None;
        }
        if request.is_navigation() {
            return Some(RequestKind::Navigation);
        }

        let path = request.url.path();
        if path.ends_with(&self.data_file) || path.starts_with(&self.api_prefix) {
            return Some(RequestKind::DynamicData);
        }
        if path.starts_with(&self.images_prefix) || self.image_pattern.is_match(path) {
            return Some(RequestKind::Image);
        }

        Some(RequestKind::Default)
    }
}
