//! Workload lifecycle flows.
//!
//! Each flow decodes what it needs from the request body, validates it, picks
//! the namespace and performs exactly one control-plane call. Failures end the
//! flow immediately and are never retried.

use core::error::Error;
use std::sync::Arc;
use std::time::Duration;

use api_types::PodStatus;
use error_stack::Report;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::cluster::CallContext;
use crate::cluster::ClusterClient;
use crate::cluster::ClusterError;
use crate::manifest;
use crate::manifest::ParseError;
use crate::status;

/// Namespace used when a manifest does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Tracing target for audit events of control-plane mutations.
pub const AUDIT_TARGET: &str = "audit";

/// Workload flow errors
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum WorkloadError {
    #[display("{_0}")]
    Parse(ParseError),
    #[display("Invalid manifest: {message}")]
    Validation { message: String },
    #[display("{_0}")]
    Cluster(ClusterError),
}

impl Error for WorkloadError {}

/// Successful end state of a write flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadOutcome {
    Created,
    Updated,
    Deleted,
}

impl WorkloadOutcome {
    /// Confirmation text returned to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Created => "Deployment created successfully",
            Self::Updated => "Deployment updated successfully",
            Self::Deleted => "Deployment deleted successfully",
        }
    }
}

/// Namespace to operate in: the requested one verbatim when non-empty,
/// [`DEFAULT_NAMESPACE`] otherwise.
pub fn effective_namespace(requested: Option<&str>) -> &str {
    match requested {
        Some(namespace) if !namespace.is_empty() => namespace,
        _ => DEFAULT_NAMESPACE,
    }
}

fn parse_failed(report: Report<ParseError>) -> Report<WorkloadError> {
    let parse_error = report.current_context().clone();
    warn!(stage = %parse_error.stage(), error = %parse_error, "Rejected workload request");
    report.change_context(WorkloadError::Parse(parse_error))
}

fn cluster_failed(report: Report<ClusterError>) -> Report<WorkloadError> {
    error!("Control-plane call failed: {report:?}");
    let cluster_error = report.current_context().clone();
    report.change_context(WorkloadError::Cluster(cluster_error))
}

fn require_name(name: &str) -> Result<(), Report<WorkloadError>> {
    if name.is_empty() {
        warn!("Rejected workload request without a name");
        return Err(Report::new(WorkloadError::Validation {
            message: "workload name must not be empty".to_string(),
        }));
    }
    Ok(())
}

/// Drives the list/create/update/delete flows against a [`ClusterClient`].
pub struct WorkloadController {
    cluster: Arc<dyn ClusterClient>,
    list_namespace: String,
    call_timeout: Duration,
    shutdown: CancellationToken,
}

impl WorkloadController {
    /// Create a controller.
    ///
    /// `list_namespace` is the namespace queried by [`Self::list_pods`];
    /// `call_timeout` bounds every control-plane call; cancelling `shutdown`
    /// aborts calls still in flight.
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        list_namespace: impl Into<String>,
        call_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            cluster,
            list_namespace: list_namespace.into(),
            call_timeout,
            shutdown,
        }
    }

    pub fn list_namespace(&self) -> &str {
        &self.list_namespace
    }

    fn call_context(&self) -> CallContext {
        CallContext::new(self.call_timeout, self.shutdown.child_token())
    }

    /// List pods of the configured namespace.
    ///
    /// # Errors
    ///
    /// - [`WorkloadError::Cluster`] if the control-plane call fails
    pub async fn list_pods(&self) -> Result<Vec<PodStatus>, Report<WorkloadError>> {
        let namespace = self.list_namespace.as_str();
        let pods = self
            .cluster
            .list_pods(namespace, &self.call_context())
            .await
            .map_err(cluster_failed)?;

        if pods.is_empty() {
            info!(namespace, "No pods found");
        } else {
            info!(namespace, count = pods.len(), "Listed pods");
        }

        Ok(status::project_all(&pods))
    }

    /// Create the workload described by `body`.
    ///
    /// # Errors
    ///
    /// - [`WorkloadError::Parse`] if the body or manifest cannot be decoded
    /// - [`WorkloadError::Validation`] if the manifest has no name
    /// - [`WorkloadError::Cluster`] if the control-plane call fails
    pub async fn create(&self, body: &[u8]) -> Result<WorkloadOutcome, Report<WorkloadError>> {
        let manifest = manifest::parse(body).map_err(parse_failed)?;
        require_name(&manifest.name)?;
        let namespace = effective_namespace(manifest.namespace.as_deref());

        self.cluster
            .create_workload(namespace, &manifest, &self.call_context())
            .await
            .map_err(cluster_failed)?;

        info!(target: AUDIT_TARGET, action = "create", namespace, name = %manifest.name, "Deployment created");
        Ok(WorkloadOutcome::Created)
    }

    /// Replace the workload described by `body`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`].
    pub async fn update(&self, body: &[u8]) -> Result<WorkloadOutcome, Report<WorkloadError>> {
        let manifest = manifest::parse(body).map_err(parse_failed)?;
        require_name(&manifest.name)?;
        let namespace = effective_namespace(manifest.namespace.as_deref());

        self.cluster
            .update_workload(namespace, &manifest, &self.call_context())
            .await
            .map_err(cluster_failed)?;

        info!(target: AUDIT_TARGET, action = "update", namespace, name = %manifest.name, "Deployment updated");
        Ok(WorkloadOutcome::Updated)
    }

    /// Delete the workload named in `body`. Only `name` and `namespace` are read.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`].
    pub async fn delete(&self, body: &[u8]) -> Result<WorkloadOutcome, Report<WorkloadError>> {
        let target = manifest::parse_reference(body).map_err(parse_failed)?;
        require_name(&target.name)?;
        let namespace = effective_namespace(target.namespace.as_deref());

        self.cluster
            .delete_workload(namespace, &target.name, &self.call_context())
            .await
            .map_err(cluster_failed)?;

        info!(target: AUDIT_TARGET, action = "delete", namespace, name = %target.name, "Deployment deleted");
        Ok(WorkloadOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::cluster::mock::ClusterCall;
    use crate::cluster::mock::SpyClusterClient;
    use crate::cluster::ClusterOperation;
    use crate::manifest::ParseStage;

    fn controller(spy: &Arc<SpyClusterClient>) -> WorkloadController {
        WorkloadController::new(
            spy.clone(),
            DEFAULT_NAMESPACE,
            Duration::from_secs(5),
            CancellationToken::new(),
        )
    }

    fn body(manifest: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "manifest": manifest }))
            .expect("should encode envelope")
    }

    fn named_pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn namespace_defaults_only_when_absent_or_empty() {
        assert_eq!(effective_namespace(None), "default");
        assert_eq!(effective_namespace(Some("")), "default");
        assert_eq!(effective_namespace(Some("staging")), "staging");
        assert_eq!(effective_namespace(Some("Staging")), "Staging");
        assert_eq!(effective_namespace(Some(" prod ")), " prod ");
    }

    #[test(tokio::test)]
    async fn create_uses_manifest_namespace() {
        let spy = Arc::new(SpyClusterClient::new());

        let outcome = controller(&spy)
            .create(&body("name: demo\nnamespace: staging\nreplicas: 2"))
            .await
            .expect("create should succeed");

        assert_eq!(outcome, WorkloadOutcome::Created);
        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        let ClusterCall::CreateWorkload {
            namespace,
            manifest,
        } = &calls[0]
        else {
            panic!("unexpected call: {:?}", calls[0]);
        };
        assert_eq!(namespace, "staging");
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.replicas, Some(2));
    }

    #[test(tokio::test)]
    async fn update_and_delete_default_the_namespace() {
        let spy = Arc::new(SpyClusterClient::new());
        let controller = controller(&spy);

        controller
            .update(&body("name: demo\nreplicas: 3"))
            .await
            .expect("update should succeed");
        controller
            .delete(&body("name: demo"))
            .await
            .expect("delete should succeed");

        let calls = spy.calls();
        assert!(matches!(
            &calls[0],
            ClusterCall::UpdateWorkload { namespace, .. } if namespace == "default"
        ));
        assert_eq!(
            calls[1],
            ClusterCall::DeleteWorkload {
                namespace: "default".to_string(),
                name: "demo".to_string(),
            }
        );
    }

    #[test(tokio::test)]
    async fn parse_failures_never_reach_the_cluster() {
        let spy = Arc::new(SpyClusterClient::new());
        let controller = controller(&spy);

        let envelope = controller
            .create(b"{broken")
            .await
            .expect_err("should reject envelope");
        assert!(matches!(
            envelope.current_context(),
            WorkloadError::Parse(e) if e.stage() == ParseStage::Envelope
        ));

        let manifest = controller
            .update(&body("name: [oops"))
            .await
            .expect_err("should reject manifest");
        assert!(matches!(
            manifest.current_context(),
            WorkloadError::Parse(e) if e.stage() == ParseStage::Manifest
        ));

        for (raw, stage) in [
            (b"[1, 2]".to_vec(), ParseStage::Envelope),
            (body("metadata: [oops]"), ParseStage::Manifest),
        ] {
            let report = controller
                .delete(&raw)
                .await
                .expect_err("should reject delete body");
            assert!(matches!(
                report.current_context(),
                WorkloadError::Parse(e) if e.stage() == stage
            ));
        }

        assert_eq!(spy.call_count(), 0);
    }

    #[test(tokio::test)]
    async fn empty_name_is_a_validation_error() {
        let spy = Arc::new(SpyClusterClient::new());
        let controller = controller(&spy);

        for result in [
            controller.create(&body("replicas: 1")).await,
            controller.update(&body("name: ''")).await,
            controller.delete(&body("namespace: staging")).await,
        ] {
            let report = result.expect_err("should reject nameless manifest");
            assert!(matches!(
                report.current_context(),
                WorkloadError::Validation { .. }
            ));
        }
        assert_eq!(spy.call_count(), 0);
    }

    #[test(tokio::test)]
    async fn list_projects_pods_from_fixed_namespace() {
        let spy =
            Arc::new(SpyClusterClient::new().with_pods(vec![named_pod("b"), named_pod("a")]));
        let controller = WorkloadController::new(
            spy.clone(),
            "ops",
            Duration::from_secs(5),
            CancellationToken::new(),
        );

        let pods = controller.list_pods().await.expect("list should succeed");

        let names: Vec<&str> = pods.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(
            spy.calls(),
            vec![ClusterCall::ListPods {
                namespace: "ops".to_string()
            }]
        );
    }

    #[test(tokio::test)]
    async fn empty_cluster_lists_nothing() {
        let spy = Arc::new(SpyClusterClient::new());

        let pods = controller(&spy)
            .list_pods()
            .await
            .expect("list should succeed");

        assert!(pods.is_empty());
    }

    #[test(tokio::test)]
    async fn cluster_failures_are_reported_once() {
        let failure = ClusterError::Operation {
            operation: ClusterOperation::DeleteWorkload,
            message: "deployments.apps \"demo\" not found".to_string(),
        };
        let spy = Arc::new(SpyClusterClient::new().failing_with(failure.clone()));

        let report = controller(&spy)
            .delete(&body("name: demo"))
            .await
            .expect_err("delete should fail");

        assert_eq!(report.current_context(), &WorkloadError::Cluster(failure));
        assert_eq!(spy.call_count(), 1);
    }

    #[test(tokio::test(start_paused = true))]
    async fn slow_cluster_times_out() {
        let spy = Arc::new(SpyClusterClient::new().with_latency(Duration::from_secs(60)));
        let controller = WorkloadController::new(
            spy.clone(),
            DEFAULT_NAMESPACE,
            Duration::from_secs(2),
            CancellationToken::new(),
        );

        let report = controller
            .create(&body("name: demo"))
            .await
            .expect_err("create should time out");

        assert_eq!(
            report.current_context(),
            &WorkloadError::Cluster(ClusterError::Timeout {
                operation: ClusterOperation::CreateWorkload,
                timeout_ms: 2000,
            })
        );
    }

    #[test(tokio::test)]
    async fn shutdown_cancels_calls() {
        let spy = Arc::new(SpyClusterClient::new().with_latency(Duration::from_secs(60)));
        let shutdown = CancellationToken::new();
        let controller = WorkloadController::new(
            spy.clone(),
            DEFAULT_NAMESPACE,
            Duration::from_secs(120),
            shutdown.clone(),
        );
        shutdown.cancel();

        let report = controller
            .list_pods()
            .await
            .expect_err("list should be cancelled");

        assert_eq!(
            report.current_context(),
            &WorkloadError::Cluster(ClusterError::Cancelled {
                operation: ClusterOperation::ListPods,
            })
        );
    }
}
