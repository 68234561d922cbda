//! cache_keys tool implementation.
//!
//! Lists a store's keys, oldest insertion first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Full store name, e.g. "vishwa-samvidhan-static-v3.4".
    pub store: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheKeysOutput {
    pub store: String,
    pub keys: Vec<CacheKey>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(db: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    if params.store.trim().is_empty() {
        return Err(ToolError::InvalidInput("store cannot be empty".into()).into());
    }
    if !db.store_exists(&params.store).await? {
        return Err(Error::CacheMiss(format!("no store named {}", params.store)).into());
    }

    let keys = db
        .store(&params.store)
        .keys()
        .await?
        .iter()
        .map(|key| CacheKey { method: key.method().to_string(), url: key.url().to_string() })
        .collect();

    json_result(&CacheKeysOutput { store: params.store, keys })
}
