//! comics_list tool implementation.
//!
//! Returns every configured comic, refreshing stale entries first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use funnies_core::Comic;

use super::{json_result, tool_error};
use crate::service::ComicService;

/// Output from the comics_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComicsListOutput {
    /// Comics in configured order.
    pub comics: Vec<Comic>,
}

pub async fn list_impl(service: &ComicService) -> Result<CallToolResult, McpError> {
    let comics = service.list_all().await.map_err(|e| tool_error("comics_list", e))?;
    json_result(&ComicsListOutput { comics })
}
