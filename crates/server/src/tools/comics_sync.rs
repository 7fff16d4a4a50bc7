//! comics_sync tool implementation.
//!
//! Runs the scheduled synchronization pass immediately.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::{json_result, tool_error};
use crate::service::ComicService;

pub async fn sync_impl(service: &ComicService) -> Result<CallToolResult, McpError> {
    let report = service.run_scheduled_sync().await.map_err(|e| tool_error("comics_sync", e))?;
    json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::service;
    use funnies_core::SyncReport;

    #[tokio::test]
    async fn test_sync_impl() {
        let (service, stubs, store) = service(&["A", "B", "C"]);

        let result = sync_impl(&service).await.unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        let report: SyncReport = serde_json::from_str(&text).unwrap();

        assert_eq!(report.fetched, 3);
        assert!(report.persisted);
        assert!(stubs.iter().all(|s| s.calls() == 1));
        assert_eq!(store.keys().await.len(), 4);
    }
}
