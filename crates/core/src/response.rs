//! Responses as returned by the network or replayed from a store.

use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Visibility of a response to the caching layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response readable through CORS.
    Cors,
    /// Cross-origin response whose success cannot be inspected.
    Opaque,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
            ResponseKind::Opaque => "opaque",
        }
    }
}

impl FromStr for ResponseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseKind::Basic),
            "cors" => Ok(ResponseKind::Cors),
            "opaque" => Ok(ResponseKind::Opaque),
            other => Err(format!("unknown response kind: {other}")),
        }
    }
}

/// A complete response. Entries are replaced whole, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL the response was served from.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub kind: ResponseKind,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into(), kind: ResponseKind::Basic }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Status in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseKind::Opaque
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_strings() {
        for kind in [ResponseKind::Basic, ResponseKind::Cors, ResponseKind::Opaque] {
            assert_eq!(kind.as_str().parse::<ResponseKind>().unwrap(), kind);
        }
        assert!("weird".parse::<ResponseKind>().is_err());
    }

    #[test]
    fn test_is_ok_range() {
        assert!(Response::new("/", 200, "").is_ok());
        assert!(Response::new("/", 204, "").is_ok());
        assert!(!Response::new("/", 304, "").is_ok());
        assert!(!Response::new("/", 404, "").is_ok());
    }

    #[test]
    fn test_header_lookup() {
        let response = Response::new("/", 200, "{}").with_header("Content-Type", "application/json");
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_opaque() {
        let response = Response::new("https://cdn.example.com/a.png", 200, "").with_kind(ResponseKind::Opaque);
        assert!(response.is_opaque());
        assert!(!Response::new("/", 200, "").is_opaque());
    }
}
