//! cache_list tool implementation.
//!
//! Lists stores owned by this worker's prefix with their entry counts.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use shellcache_client::OfflineWorker;
use shellcache_core::StoreName;

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub name: String,
    pub role: Option<String>,
    pub version: String,
    pub entries: usize,
    /// Whether the store belongs to the running version.
    pub current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheListOutput {
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(worker: &OfflineWorker) -> Result<CallToolResult, McpError> {
    let config = worker.config();
    let mut stores = Vec::new();
    for name in worker.owned_store_names().await? {
        let Some(parsed) = StoreName::parse(&config.prefix, &name) else {
            continue;
        };
        let entries = worker.db().store(&name).len().await?;
        stores.push(StoreSummary {
            name,
            role: parsed.role().map(String::from),
            version: parsed.version().to_string(),
            entries,
            current: !parsed.is_stale(&config.version),
        });
    }

    json_result(&CacheListOutput { stores })
}
