//! MCP tool implementations.
//!
//! This module contains all tools exposed by the funnies server.

pub mod comic_get;
pub mod comics_list;
pub mod comics_sync;

pub use comic_get::{ComicGetParams, get_impl};
pub use comics_list::list_impl;
pub use comics_sync::sync_impl;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use funnies_core::Error;

/// Render `output` as a pretty JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Log store failures before they are reduced to a generic MCP error.
pub(crate) fn tool_error(tool: &str, err: Error) -> McpError {
    if err.is_store_error() {
        tracing::error!(tool, error = %err, "cache failure");
    } else {
        tracing::debug!(tool, error = %err, "tool call rejected");
    }
    err.into()
}
