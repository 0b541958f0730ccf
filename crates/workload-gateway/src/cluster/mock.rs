//! Recording [`ClusterClient`] for tests.
//!
//! [`SpyClusterClient`] records every call with its arguments, returns canned
//! pods, and can be told to fail or to respond slowly. Responses go through
//! [`bounded`] so timeouts and cancellation behave as they do against a real
//! control plane.

use std::convert::Infallible;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

use super::call::bounded;
use super::call::CallContext;
use super::types::ClusterError;
use super::types::ClusterOperation;
use super::ClusterClient;
use crate::manifest::WorkloadManifest;

/// A call received by [`SpyClusterClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterCall {
    ListPods {
        namespace: String,
    },
    CreateWorkload {
        namespace: String,
        manifest: WorkloadManifest,
    },
    UpdateWorkload {
        namespace: String,
        manifest: WorkloadManifest,
    },
    DeleteWorkload {
        namespace: String,
        name: String,
    },
}

#[derive(Default)]
pub struct SpyClusterClient {
    calls: Mutex<Vec<ClusterCall>>,
    pods: Mutex<Vec<Pod>>,
    failure: Mutex<Option<ClusterError>>,
    latency: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SpyClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pods returned by `list_pods`
    pub fn with_pods(self, pods: Vec<Pod>) -> Self {
        *lock(&self.pods) = pods;
        self
    }

    /// Make every call fail with `error` after being recorded
    pub fn failing_with(self, error: ClusterError) -> Self {
        *lock(&self.failure) = Some(error);
        self
    }

    /// Delay every response by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        *lock(&self.latency) = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    async fn respond<T>(
        &self,
        call: ClusterCall,
        operation: ClusterOperation,
        ctx: &CallContext,
        value: T,
    ) -> Result<T, Report<ClusterError>> {
        lock(&self.calls).push(call);

        let latency = *lock(&self.latency);
        let failure = lock(&self.failure).clone();

        bounded(operation, ctx, async {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            Ok::<_, Infallible>(())
        })
        .await?;

        match failure {
            Some(error) => Err(Report::new(error)),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl ClusterClient for SpyClusterClient {
    async fn list_pods(
        &self,
        namespace: &str,
        ctx: &CallContext,
    ) -> Result<Vec<Pod>, Report<ClusterError>> {
        let pods = lock(&self.pods).clone();
        let call = ClusterCall::ListPods {
            namespace: namespace.to_string(),
        };
        self.respond(call, ClusterOperation::ListPods, ctx, pods).await
    }

    async fn create_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
        ctx: &CallContext,
    ) -> Result<Deployment, Report<ClusterError>> {
        let call = ClusterCall::CreateWorkload {
            namespace: namespace.to_string(),
            manifest: manifest.clone(),
        };
        let deployment = manifest.to_deployment(namespace);
        self.respond(call, ClusterOperation::CreateWorkload, ctx, deployment)
            .await
    }

    async fn update_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
        ctx: &CallContext,
    ) -> Result<Deployment, Report<ClusterError>> {
        let call = ClusterCall::UpdateWorkload {
            namespace: namespace.to_string(),
            manifest: manifest.clone(),
        };
        let deployment = manifest.to_deployment(namespace);
        self.respond(call, ClusterOperation::UpdateWorkload, ctx, deployment)
            .await
    }

    async fn delete_workload(
        &self,
        namespace: &str,
        name: &str,
        ctx: &CallContext,
    ) -> Result<(), Report<ClusterError>> {
        let call = ClusterCall::DeleteWorkload {
            namespace: namespace.to_string(),
            name: name.to_string(),
        };
        self.respond(call, ClusterOperation::DeleteWorkload, ctx, ())
            .await
    }
}
