use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::DeleteParams;
use kube::api::ListParams;
use kube::api::PostParams;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Api;
use kube::Client;
use kube::Config;
use tokio::sync::OnceCell;
use tracing::info;

use super::call::bounded_report;
use super::call::operation_failed;
use super::call::CallContext;
use super::types::ClusterError;
use super::types::ClusterOperation;
use super::ClusterClient;
use crate::manifest::WorkloadManifest;

/// Authenticated handle to the control plane.
///
/// Read-only once connected; cloning the inner client is cheap and shares
/// the underlying connection pool.
#[derive(Clone)]
pub struct ClusterSession {
    client: Client,
}

impl ClusterSession {
    /// Connect using `kubeconfig`, or the in-cluster / `~/.kube/config`
    /// defaults when no path is given.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::ConnectionInit`] if the configuration cannot be
    ///   loaded or the client cannot be built
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self, Report<ClusterError>> {
        let client = match kubeconfig {
            Some(kubeconfig_path) => {
                let kubeconfig = Kubeconfig::read_from(kubeconfig_path).change_context(
                    ClusterError::ConnectionInit {
                        message: format!(
                            "Failed to read kubeconfig file: {}",
                            kubeconfig_path.display()
                        ),
                    },
                )?;

                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .change_context(ClusterError::ConnectionInit {
                            message: format!(
                                "Failed to create config from kubeconfig: {}",
                                kubeconfig_path.display()
                            ),
                        })?;

                Client::try_from(config).change_context(ClusterError::ConnectionInit {
                    message: "Failed to create client from custom kubeconfig".to_string(),
                })?
            }
            None => Client::try_default()
                .await
                .change_context(ClusterError::ConnectionInit {
                    message: "Failed to create client from default configuration".to_string(),
                })?,
        };

        info!(kubeconfig = ?kubeconfig, "Connected to Kubernetes control plane");
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

/// [`ClusterClient`] backed by the Kubernetes API.
///
/// The session is established on first use and then shared by every request.
/// A failed connection attempt is reported to the request that triggered it;
/// the next request tries again. Connecting counts against the triggering
/// call's timeout and cancellation.
pub struct KubeClusterClient {
    kubeconfig: Option<PathBuf>,
    session: OnceCell<ClusterSession>,
}

impl KubeClusterClient {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            kubeconfig,
            session: OnceCell::new(),
        }
    }

    /// Wrap an already connected session.
    pub fn with_session(session: ClusterSession) -> Self {
        Self {
            kubeconfig: None,
            session: OnceCell::new_with(Some(session)),
        }
    }

    /// Get the shared session, connecting on first use.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::ConnectionInit`] if connecting fails
    pub async fn session(&self) -> Result<&ClusterSession, Report<ClusterError>> {
        self.session
            .get_or_try_init(|| ClusterSession::connect(self.kubeconfig.as_deref()))
            .await
    }

    async fn pods(&self, namespace: &str) -> Result<Api<Pod>, Report<ClusterError>> {
        Ok(Api::namespaced(self.session().await?.client(), namespace))
    }

    async fn deployments(&self, namespace: &str) -> Result<Api<Deployment>, Report<ClusterError>> {
        Ok(Api::namespaced(self.session().await?.client(), namespace))
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_pods(
        &self,
        namespace: &str,
        ctx: &CallContext,
    ) -> Result<Vec<Pod>, Report<ClusterError>> {
        let operation = ClusterOperation::ListPods;
        let pods = bounded_report(operation, ctx, async {
            let api = self.pods(namespace).await?;
            api.list(&ListParams::default())
                .await
                .map_err(|e| operation_failed(operation, e))
        })
        .await
        .attach_printable_lazy(|| format!("namespace: {namespace}"))?;
        Ok(pods.items)
    }

    async fn create_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
        ctx: &CallContext,
    ) -> Result<Deployment, Report<ClusterError>> {
        let operation = ClusterOperation::CreateWorkload;
        let deployment = manifest.to_deployment(namespace);
        bounded_report(operation, ctx, async {
            let api = self.deployments(namespace).await?;
            api.create(&PostParams::default(), &deployment)
                .await
                .map_err(|e| operation_failed(operation, e))
        })
        .await
        .attach_printable_lazy(|| format!("deployment: {namespace}/{}", manifest.name))
    }

    async fn update_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
        ctx: &CallContext,
    ) -> Result<Deployment, Report<ClusterError>> {
        let operation = ClusterOperation::UpdateWorkload;
        let deployment = manifest.to_deployment(namespace);
        bounded_report(operation, ctx, async {
            let api = self.deployments(namespace).await?;
            api.replace(&manifest.name, &PostParams::default(), &deployment)
                .await
                .map_err(|e| operation_failed(operation, e))
        })
        .await
        .attach_printable_lazy(|| format!("deployment: {namespace}/{}", manifest.name))
    }

    async fn delete_workload(
        &self,
        namespace: &str,
        name: &str,
        ctx: &CallContext,
    ) -> Result<(), Report<ClusterError>> {
        let operation = ClusterOperation::DeleteWorkload;
        bounded_report(operation, ctx, async {
            let api = self.deployments(namespace).await?;
            api.delete(name, &DeleteParams::default())
                .await
                .map_err(|e| operation_failed(operation, e))
        })
        .await
        .attach_printable_lazy(|| format!("deployment: {namespace}/{name}"))?;
        Ok(())
    }
}
