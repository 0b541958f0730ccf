//! Kubernetes control-plane access.
//!
//! The main components are:
//! - [`ClusterClient`]: the four primitives the controller drives
//! - [`KubeClusterClient`]: implementation backed by a lazily connected [`ClusterSession`]
//! - [`CallContext`]: timeout and cancellation bound applied to every call
//! - [`mock::SpyClusterClient`]: recording fake for tests

use async_trait::async_trait;
use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

use crate::manifest::WorkloadManifest;

pub mod call;
pub mod kube_client;
pub mod mock;
pub mod types;

pub use call::bounded;
pub use call::bounded_report;
pub use call::operation_failed;
pub use call::CallContext;
pub use kube_client::ClusterSession;
pub use kube_client::KubeClusterClient;
pub use types::ClusterError;
pub use types::ClusterOperation;

/// Primitives against the control plane.
///
/// Every method is a single control-plane call in an explicit namespace and
/// must honour the timeout and cancellation of `ctx`. Namespace defaulting
/// is the caller's job.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List all pods in `namespace`. An empty list is not an error.
    async fn list_pods(
        &self,
        namespace: &str,
        ctx: &CallContext,
    ) -> Result<Vec<Pod>, Report<ClusterError>>;

    /// Create the Deployment described by `manifest`.
    async fn create_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
        ctx: &CallContext,
    ) -> Result<Deployment, Report<ClusterError>>;

    /// Replace the existing Deployment named by `manifest`.
    async fn update_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
        ctx: &CallContext,
    ) -> Result<Deployment, Report<ClusterError>>;

    /// Delete the Deployment `name`.
    async fn delete_workload(
        &self,
        namespace: &str,
        name: &str,
        ctx: &CallContext,
    ) -> Result<(), Report<ClusterError>>;
}
