//! worker_fetch tool implementation.
//!
//! Issues a page request through the worker, as if the page had fetched it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::canonicalize;
use shellcache_client::{OfflineWorker, Request, ResponseSource, Route, ServiceWorker};
use shellcache_core::{Error, ResponseType};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Anything but GET bypasses the cache.
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional request body, sent as-is.
    #[serde(default)]
    pub body: Option<String>,

    /// Id of the page issuing the request. The page is registered with the
    /// worker, and claimed on activation.
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// URL the response was produced for, after redirects.
    pub final_url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
    /// Where the answer came from.
    pub source: ResponseSource,
    pub route: Route,
    /// Worker version controlling the requesting page, when one was named.
    pub controller: Option<String>,
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &OfflineWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(worker.config().origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::new(params.method.trim(), url);
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let controller = match params.client_id.as_deref().map(str::trim) {
        Some("") => return Err(ToolError::InvalidInput("client_id cannot be empty".into()).into()),
        Some(id) => worker.register_client(id).await,
        None => None,
    };

    let requested = request.url.to_string();
    let outcome = worker.on_fetch(request).await?;
    let response = outcome.response;

    let body = String::from_utf8_lossy(&response.body).to_string();
    let output = WorkerFetchOutput {
        url: requested,
        final_url: response.url,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        response_type: response.response_type,
        body,
        body_bytes: response.body.len(),
        source: outcome.source,
        route: outcome.route,
        controller,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::result_json;
    use crate::tools::testing::{ORIGIN, shell_network, worker};

    fn params(url: &str) -> WorkerFetchParams {
        WorkerFetchParams { url: url.into(), method: default_method(), body: None, client_id: None }
    }

    #[tokio::test]
    async fn test_fetch_relative_path_from_cache() {
        let worker = worker(shell_network()).await;
        worker.start().await.unwrap();

        let json = result_json(&fetch_impl(&worker, params("/index.html")).await.unwrap());

        assert_eq!(json["url"], format!("{ORIGIN}/index.html"));
        assert_eq!(json["status"], 200);
        assert_eq!(json["body"], "index");
        assert_eq!(json["source"], "cache");
        assert_eq!(json["route"]["class"], "own_origin_static");
        worker.settle().await;
    }

    #[tokio::test]
    async fn test_fetch_post_bypasses() {
        let network = shell_network();
        network.respond_text(&format!("{ORIGIN}/feedback"), 201, "thanks");
        let worker = worker(network.clone()).await;
        worker.start().await.unwrap();

        let params =
            WorkerFetchParams {
            url: "/feedback".into(),
            method: "post".into(),
            body: Some("hello".into()),
            client_id: None,
        };
        let json = result_json(&fetch_impl(&worker, params).await.unwrap());

        assert_eq!(json["status"], 201);
        assert_eq!(json["route"]["route"], "bypass");
        assert!(network.calls().contains(&format!("POST {ORIGIN}/feedback")));
    }

    #[tokio::test]
    async fn test_fetch_network_error_maps_to_code() {
        let network = shell_network();
        network.fail("https://www.google-analytics.com/analytics.js", "offline");
        let worker = worker(network).await;
        worker.start().await.unwrap();

        let err = fetch_impl(&worker, params("https://www.google-analytics.com/analytics.js")).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }

    #[tokio::test]
    async fn test_fetch_registers_requesting_page() {
        let worker = worker(shell_network()).await;

        let before = WorkerFetchParams { client_id: Some("tab-1".into()), ..params("/index.html") };
        let json = result_json(&fetch_impl(&worker, before).await.unwrap());
        assert!(json["controller"].is_null());

        let (_, activated) = worker.start().await.unwrap();
        assert_eq!(activated.unwrap().claimed, 1);

        let after = WorkerFetchParams { client_id: Some("tab-2".into()), ..params("/index.html") };
        let json = result_json(&fetch_impl(&worker, after).await.unwrap());
        assert_eq!(json["controller"], "v2");
        worker.settle().await;
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let worker = worker(shell_network()).await;
        let err = fetch_impl(&worker, params("  ")).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let worker = worker(shell_network()).await;
        let err = fetch_impl(&worker, params("ftp://samvidhan.example/file")).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
