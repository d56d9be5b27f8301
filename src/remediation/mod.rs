//! Remediation gate
//!
//! Decides whether a recommended action turns into a container restart and
//! records how it went. A restart is only attempted for allow-listed names,
//! whatever the diagnosis says.

pub mod runtime;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{ContainerInfo, RecommendedAction, RemediationStatus};

pub use runtime::{ContainerHandle, ContainerRuntime, DockerCli, RuntimeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationOutcome {
    pub status: RemediationStatus,
    pub message: String,
}

impl RemediationOutcome {
    fn new(status: RemediationStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self::new(RemediationStatus::Failed, message)
    }
}

#[derive(Clone)]
pub struct RemediationGate {
    runtime: Arc<dyn ContainerRuntime>,
    allow_list: Vec<String>,
    timeout: Duration,
}

impl RemediationGate {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, allow_list: Vec<String>, timeout: Duration) -> Self {
        Self {
            runtime,
            allow_list,
            timeout,
        }
    }

    pub fn allow_list(&self) -> &[String] {
        &self.allow_list
    }

    /// Gate an incident's container against the configured allow-list
    pub async fn remediate(&self, action: RecommendedAction, container: &ContainerInfo) -> RemediationOutcome {
        self.maybe_remediate(action, &container.id, &container.name, &self.allow_list)
            .await
    }

    pub async fn maybe_remediate(
        &self,
        action: RecommendedAction,
        target_id: &str,
        target_name: &str,
        allow_list: &[String],
    ) -> RemediationOutcome {
        if action != RecommendedAction::Restart {
            return RemediationOutcome::new(RemediationStatus::NotAttempted, "No action taken.");
        }

        if !is_allowed(allow_list, target_name) {
            tracing::warn!("Container {} is not in the allowed list. Restart aborted.", target_name);
            return RemediationOutcome::failed(format!(
                "Container {} is not allowed to be restarted.",
                target_name
            ));
        }

        let handle = match self.bounded(self.runtime.lookup(target_id)).await {
            Ok(handle) => handle,
            Err(e) => return self.runtime_failure(target_id, e),
        };

        // The id may belong to a different container than the alert claims.
        if !is_allowed(allow_list, &handle.name) {
            tracing::warn!(
                "Container {} resolves to {}, which is not in the allowed list. Restart aborted.",
                target_id,
                handle.name
            );
            return RemediationOutcome::failed(format!(
                "Container {} is not allowed to be restarted.",
                handle.name
            ));
        }

        match self.bounded(self.runtime.restart(&handle)).await {
            Ok(()) => {
                tracing::info!("Successfully restarted container: {} (ID: {})", handle.name, target_id);
                RemediationOutcome::new(
                    RemediationStatus::Success,
                    format!("Container {} restarted successfully.", handle.name),
                )
            }
            Err(e) => self.runtime_failure(target_id, e),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, RuntimeError>>,
    ) -> Result<T, RuntimeError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RuntimeError::Timeout(self.timeout.as_secs()))?
    }

    fn runtime_failure(&self, target_id: &str, err: RuntimeError) -> RemediationOutcome {
        match err {
            RuntimeError::NotFound(_) => {
                tracing::error!("Container with ID {} not found.", target_id);
                RemediationOutcome::failed("Container not found.")
            }
            other => {
                tracing::error!("Error restarting container {}: {}", target_id, other);
                RemediationOutcome::failed(other.to_string())
            }
        }
    }
}

fn is_allowed(allow_list: &[String], name: &str) -> bool {
    allow_list.iter().any(|allowed| allowed == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRuntime;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn gate(runtime: Arc<FakeRuntime>, allow: &[&str]) -> RemediationGate {
        RemediationGate::new(
            runtime,
            allow.iter().map(|s| s.to_string()).collect(),
            TIMEOUT,
        )
    }

    #[tokio::test]
    async fn test_non_restart_actions_are_not_attempted() {
        let runtime = Arc::new(FakeRuntime::with_container("c1", "buggy-app-v2"));
        let gate = gate(runtime.clone(), &["buggy-app-v2"]);

        for action in [RecommendedAction::Ignore, RecommendedAction::ScaleOut] {
            let outcome = gate
                .maybe_remediate(action, "c1", "buggy-app-v2", gate.allow_list())
                .await;
            assert_eq!(outcome.status, RemediationStatus::NotAttempted);
        }
        assert_eq!(runtime.lookup_count(), 0);
        assert_eq!(runtime.restart_count(), 0);
    }

    #[tokio::test]
    async fn test_allowed_restart_succeeds() {
        let runtime = Arc::new(FakeRuntime::with_container("c1", "buggy-app-v2"));
        let gate = gate(runtime.clone(), &["buggy-app-v2"]);

        let outcome = gate
            .maybe_remediate(RecommendedAction::Restart, "c1", "buggy-app-v2", gate.allow_list())
            .await;

        assert_eq!(outcome.status, RemediationStatus::Success);
        assert_eq!(outcome.message, "Container buggy-app-v2 restarted successfully.");
        assert_eq!(runtime.restart_count(), 1);
    }

    #[tokio::test]
    async fn test_disallowed_target_never_reaches_runtime() {
        let runtime = Arc::new(FakeRuntime::with_container("c1", "buggy-app-v2"));
        let gate = gate(runtime.clone(), &[]);

        let allow_lists: Vec<Vec<String>> = vec![
            vec![],
            vec!["other-app".to_string()],
            vec!["buggy-app".to_string(), "BUGGY-APP-V2".to_string()],
        ];
        for allow_list in allow_lists {
            let outcome = gate
                .maybe_remediate(RecommendedAction::Restart, "c1", "buggy-app-v2", &allow_list)
                .await;
            assert_eq!(outcome.status, RemediationStatus::Failed);
            assert!(outcome.message.contains("buggy-app-v2"));
        }
        assert_eq!(runtime.lookup_count(), 0);
        assert_eq!(runtime.restart_count(), 0);
    }

    #[tokio::test]
    async fn test_id_resolving_to_other_container_is_refused() {
        let runtime = Arc::new(FakeRuntime::with_container("c1", "postgres"));
        let gate = gate(runtime.clone(), &["buggy-app-v2"]);

        let outcome = gate
            .maybe_remediate(RecommendedAction::Restart, "c1", "buggy-app-v2", gate.allow_list())
            .await;

        assert_eq!(outcome.status, RemediationStatus::Failed);
        assert!(outcome.message.contains("postgres"));
        assert_eq!(runtime.restart_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_container_reports_not_found() {
        let runtime = Arc::new(FakeRuntime::empty());
        let gate = gate(runtime.clone(), &["buggy-app-v2"]);

        let outcome = gate
            .maybe_remediate(RecommendedAction::Restart, "gone", "buggy-app-v2", gate.allow_list())
            .await;

        assert_eq!(outcome.status, RemediationStatus::Failed);
        assert_eq!(outcome.message, "Container not found.");
        assert_eq!(runtime.restart_count(), 0);
    }

    #[tokio::test]
    async fn test_runtime_error_detail_is_kept() {
        let runtime = Arc::new(
            FakeRuntime::with_container("c1", "buggy-app-v2").failing_restart("daemon unavailable"),
        );
        let gate = gate(runtime.clone(), &["buggy-app-v2"]);

        let outcome = gate
            .remediate(
                RecommendedAction::Restart,
                &ContainerInfo {
                    id: "c1".to_string(),
                    name: "buggy-app-v2".to_string(),
                    image: None,
                },
            )
            .await;

        assert_eq!(outcome.status, RemediationStatus::Failed);
        assert_eq!(outcome.message, "daemon unavailable");
        assert_eq!(runtime.restart_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_runtime_times_out() {
        let runtime = Arc::new(
            FakeRuntime::with_container("c1", "buggy-app-v2").hanging_restart(),
        );
        let gate = gate(runtime.clone(), &["buggy-app-v2"]);

        let outcome = gate
            .maybe_remediate(RecommendedAction::Restart, "c1", "buggy-app-v2", gate.allow_list())
            .await;

        assert_eq!(outcome.status, RemediationStatus::Failed);
        assert_eq!(outcome.message, "Runtime call timed out after 5s");
    }
}
