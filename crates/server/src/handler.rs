//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::runtime::Runtime;
use crate::tools::cache::{CacheKeysParams, CachePurgeParams, keys_impl, purge_impl, stores_impl};
use crate::tools::fetch::{SwFetchParams, fetch_impl};
use crate::tools::lifecycle::{
    SwMessageParams, SwRegisterParams, ViewsSyncParams, message_impl, register_impl, release_impl, status_impl,
    views_sync_impl,
};
use crate::tools::push::{SwNotificationClickParams, SwPushParams, notification_click_impl, push_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for the larder worker.
#[derive(Clone)]
pub struct WorkerServer {
    tool_router: ToolRouter<Self>,
    runtime: Arc<Runtime>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl WorkerServer {
    /// Create a new server handler.
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self { tool_router: Self::tool_router(), runtime }
    }

    #[tool(
        description = "Register a worker version: precache the app shell, then activate it or leave it waiting behind the active version."
    )]
    async fn sw_register(&self, params: Parameters<SwRegisterParams>) -> Result<CallToolResult, McpError> {
        register_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Installing, waiting and active worker versions, known-good stores and open views.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.runtime).await
    }

    #[tool(description = "Post a message to the worker. {\"type\": \"SKIP_WAITING\"} activates the waiting version now.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.runtime, params.0).await
    }

    #[tool(description = "The active version has no views left; the waiting version takes over.")]
    async fn sw_release(&self) -> Result<CallToolResult, McpError> {
        release_impl(&self.runtime).await
    }

    /// Intercept one outgoing request.
    ///
    /// Non-GET requests and requests from unclaimed views go to the network unmodified.
    #[tool(
        description = "Intercept one outgoing request from the application. Returns the strategy used and the response, served from the network, a store or a fallback asset."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Deliver a push payload. Always shows a notification; returns it with its id.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Click a shown notification: focus a view already at its URL, or open a new one.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Report the application's open views (id and current URL).")]
    async fn views_sync(&self, params: Parameters<ViewsSyncParams>) -> Result<CallToolResult, McpError> {
        views_sync_impl(&self.runtime, params.0).await
    }

    #[tool(description = "List stores in creation order with their entry counts.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.runtime.stores).await
    }

    #[tool(description = "List the keys of one store, oldest first.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.runtime.stores, params.0).await
    }

    #[tool(description = "Trim a store to its newest max_entries entries, and/or drop it.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.runtime.stores, params.0).await
    }
}

impl ServerHandler for WorkerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "larder-worker".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
