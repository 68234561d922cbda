//! worker_install and worker_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use shellcache_client::{OfflineWorker, ServiceWorker};

use super::json_result;

/// Run the install trigger: precache the app shell.
pub async fn install_impl(worker: &OfflineWorker) -> Result<CallToolResult, McpError> {
    let report = worker.on_install().await?;
    json_result(&report)
}

/// Run the activate trigger: drop stale stores and claim open pages.
pub async fn activate_impl(worker: &OfflineWorker) -> Result<CallToolResult, McpError> {
    let report = worker.on_activate().await?;
    json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::result_json;
    use crate::tools::testing::{ORIGIN, shell_network, worker};

    #[tokio::test]
    async fn test_install_reports_failed_assets() {
        let network = shell_network();
        network.fail(&format!("{ORIGIN}/style.css"), "connection reset");
        let worker = worker(network).await;

        let result = install_impl(&worker).await.unwrap();
        let json = result_json(&result);

        assert_eq!(json["version"], "v2");
        assert_eq!(json["store"], "app-static-v2");
        assert_eq!(json["cached"].as_array().unwrap().len(), 2);
        assert_eq!(json["failed"][0]["url"], format!("{ORIGIN}/style.css"));
    }

    #[tokio::test]
    async fn test_activate_before_install_is_rejected() {
        let worker = worker(shell_network()).await;
        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32007);
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let worker = worker(shell_network()).await;
        worker.db().open_store("app-static-v1").await.unwrap();

        install_impl(&worker).await.unwrap();
        let json = result_json(&activate_impl(&worker).await.unwrap());

        assert_eq!(json["deleted"], serde_json::json!(["app-static-v1"]));
        assert_eq!(json["claimed"], 0);
    }

    #[tokio::test]
    async fn test_second_install_is_rejected() {
        let worker = worker(shell_network()).await;
        install_impl(&worker).await.unwrap();
        assert!(install_impl(&worker).await.is_err());
    }
}
