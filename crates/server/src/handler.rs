//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the comic service.
use std::sync::Arc;

use crate::service::ComicService;
use crate::tools::{ComicGetParams, get_impl, list_impl, sync_impl};

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

/// The main MCP server handler for funnies.
#[derive(Clone)]
pub struct FunniesServer {
    tool_router: ToolRouter<Self>,
    service: Arc<ComicService>,
}

#[tool_router]
impl FunniesServer {
    pub fn new(service: Arc<ComicService>) -> Self {
        Self { tool_router: Self::tool_router(), service }
    }

    /// List every configured comic.
    ///
    /// Stale entries are refetched before answering; a comic whose source is
    /// down keeps its last good content for a while.
    #[tool(description = "List all configured webcomics with their latest cached content. Stale comics are refreshed first.")]
    async fn comics_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.service).await
    }

    #[tool(description = "Get one webcomic by name, refreshing it if its cached copy is stale.")]
    async fn comic_get(&self, params: Parameters<ComicGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.service, params.0).await
    }

    #[tool(description = "Run a background synchronization pass now and report what changed.")]
    async fn comics_sync(&self) -> Result<CallToolResult, McpError> {
        sync_impl(&self.service).await
    }
}

impl ServerHandler for FunniesServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "funnies".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!("Serves webcomics: {}.", self.service.names().join(", "))),
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
