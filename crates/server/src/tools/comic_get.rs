//! comic_get tool implementation.
//!
//! Returns one comic by name, refreshing it alone if stale.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use funnies_core::Error;

use super::{json_result, tool_error};
use crate::service::ComicService;

/// Parameters for the comic_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComicGetParams {
    /// Exact name of a configured comic, e.g. "XKCD".
    pub name: String,
}

pub async fn get_impl(service: &ComicService, params: ComicGetParams) -> Result<CallToolResult, McpError> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("comic name must not be empty".into()).into());
    }

    let comic = service.get_one(name).await.map_err(|e| tool_error("comic_get", e))?;
    json_result(&comic)
}
