//! sw_fetch tool implementation.
//!
//! Delivers one outgoing request to the interception layer. Requests the active
//! version doesn't intercept go straight to the network.

use std::collections::BTreeMap;

use larder_client::resolve;
use larder_core::{Error, Request, RequestMode, Response, ResponseKind};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::WorkerError;
use crate::runtime::Runtime;
use crate::worker::{FetchOutcome, RequestKind};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Path or absolute URL. Paths resolve against the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "cors" (default) or "no-cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// Accept header. Navigations default to text/html.
    #[serde(default)]
    pub accept: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<String>,

    /// View that issued the request. Requests from views the active version
    /// hasn't claimed are not intercepted.
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub intercepted: bool,
    /// Strategy that produced the response, when intercepted.
    pub strategy: Option<RequestKind>,
    pub url: String,
    pub status: u16,
    pub kind: ResponseKind,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

impl SwFetchOutput {
    fn new(strategy: Option<RequestKind>, response: Response) -> Self {
        Self {
            intercepted: strategy.is_some(),
            strategy,
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
            url: response.url,
            status: response.status,
            kind: response.kind,
            headers: response.headers,
        }
    }
}

fn build_request(runtime: &Runtime, params: SwFetchParams) -> Result<Request, WorkerError> {
    let origin = url::Url::parse(&runtime.config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let url = resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    if params.method.is_empty() || !params.method.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(WorkerError::InvalidInput(format!("invalid method: {:?}", params.method)));
    }

    let mut request = Request::get(url).with_method(&params.method).with_mode(params.mode);
    match params.accept {
        Some(accept) => request = request.with_header("Accept", &accept),
        None if request.is_navigation() => request = request.with_header("Accept", "text/html,application/xhtml+xml"),
        None => {}
    }
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(runtime: &Runtime, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let client_id = params.client_id.clone();
    let request = build_request(runtime, params)?;

    let output = match runtime.registration.handle_fetch(&request, client_id.as_deref()).await? {
        FetchOutcome::Respond { kind, response } => SwFetchOutput::new(Some(kind), response),
        FetchOutcome::Passthrough => {
            tracing::debug!(method = %request.method, url = %request.url, "not intercepted");
            SwFetchOutput::new(None, runtime.network.fetch(&request).await?)
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubNetwork, output_json, runtime};
    use std::sync::Arc;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams {
            url: url.to_string(),
            method: default_method(),
            mode: RequestMode::default(),
            accept: None,
            headers: BTreeMap::new(),
            body: None,
            client_id: None,
        }
    }

    #[tokio::test]
    async fn test_passthrough_without_active_worker() {
        let network = Arc::new(StubNetwork::with_app_shell());
        let rt = runtime(network.clone());

        let out = output_json(&fetch_impl(&rt, params("/style.css")).await.unwrap());
        assert_eq!(out["intercepted"], false);
        assert_eq!(out["body"], "shell:/style.css");
        assert_eq!(network.calls(), vec!["GET http://localhost:8080/style.css"]);
    }

    #[tokio::test]
    async fn test_post_reaches_network_unmodified() {
        let network = Arc::new(StubNetwork::with_app_shell());
        let rt = runtime(network.clone());
        rt.bootstrap().await.unwrap();
        let before = network.calls().len();

        let post = SwFetchParams { method: "post".into(), body: Some("{\"title\":\"Soup\"}".into()), ..params("/api/recipes") };
        let out = output_json(&fetch_impl(&rt, post).await.unwrap());
        assert_eq!(out["intercepted"], false);
        assert!(out["strategy"].is_null());
        assert_eq!(network.calls()[before..], ["POST http://localhost:8080/api/recipes".to_string()]);
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_offline_page() {
        let network = Arc::new(StubNetwork::with_app_shell());
        let rt = runtime(network.clone());
        rt.bootstrap().await.unwrap();
        network.go_offline();

        let nav = SwFetchParams { mode: RequestMode::Navigate, ..params("/recipes/12") };
        let out = output_json(&fetch_impl(&rt, nav).await.unwrap());
        assert_eq!(out["intercepted"], true);
        assert_eq!(out["strategy"], "navigation");
        assert_eq!(out["body"], "shell:/offline.html");

        network.go_online();
        let nav = SwFetchParams { mode: RequestMode::Navigate, ..params("/") };
        let out = output_json(&fetch_impl(&rt, nav).await.unwrap());
        assert_eq!(out["body"], "shell:/");
    }

    #[tokio::test]
    async fn test_offline_non_html_is_an_error() {
        let network = Arc::new(StubNetwork::with_app_shell());
        let rt = runtime(network.clone());
        rt.bootstrap().await.unwrap();
        network.go_offline();

        let csv = SwFetchParams { accept: Some("text/csv".into()), ..params("/export.csv") };
        let err = fetch_impl(&rt, csv).await.unwrap_err();
        assert_eq!(err.code.0, -32014);
        assert!(err.message.contains("/export.csv"));

        let page = SwFetchParams { accept: Some("text/html".into()), ..params("/about") };
        let out = output_json(&fetch_impl(&rt, page).await.unwrap());
        assert_eq!(out["body"], "shell:/offline.html");
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let rt = runtime(Arc::new(StubNetwork::new()));
        assert_eq!(fetch_impl(&rt, params("")).await.unwrap_err().code.0, -32003);
        assert_eq!(fetch_impl(&rt, params("ftp://example.com/a")).await.unwrap_err().code.0, -32003);

        let bad = SwFetchParams { method: "GE T".into(), ..params("/") };
        assert_eq!(fetch_impl(&rt, bad).await.unwrap_err().code.0, -32602);
    }
}
