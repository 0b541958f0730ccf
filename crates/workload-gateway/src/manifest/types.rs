use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;

/// Selector label applied when a manifest carries no labels of its own.
pub const APP_LABEL: &str = "app";

/// A single container of a workload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSpec {
    /// Container name, derived from the workload name when empty
    #[serde(default)]
    pub name: String,
    /// Image reference
    pub image: String,
}

/// Workload description decoded from a request.
///
/// Built per request by the manifest parser and handed to the cluster client
/// once the controller has validated it. When the caller sent a complete
/// `apps/v1` Deployment, that document is kept and rendered unchanged apart
/// from its namespace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkloadManifest {
    pub name: String,
    pub namespace: Option<String>,
    pub replicas: Option<i32>,
    pub containers: Vec<ContainerSpec>,
    pub labels: BTreeMap<String, String>,
    document: Option<Box<Deployment>>,
}

/// Name and namespace of an existing workload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkloadRef {
    pub name: String,
    pub namespace: Option<String>,
}

/// Shorthand manifest shape: `name`, `namespace`, `replicas`, `image`,
/// `containers`, `labels`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct FlatManifest {
    #[serde(default)]
    name: String,
    namespace: Option<String>,
    replicas: Option<i32>,
    image: Option<String>,
    #[serde(default)]
    containers: Vec<ContainerSpec>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl From<FlatManifest> for WorkloadManifest {
    fn from(flat: FlatManifest) -> Self {
        let mut containers = flat.containers;
        if let Some(image) = flat.image {
            containers.insert(
                0,
                ContainerSpec {
                    name: String::new(),
                    image,
                },
            );
        }

        Self {
            name: flat.name,
            namespace: flat.namespace,
            replicas: flat.replicas,
            containers,
            labels: flat.labels,
            document: None,
        }
    }
}

impl From<Deployment> for WorkloadManifest {
    fn from(deployment: Deployment) -> Self {
        let metadata = &deployment.metadata;
        let spec = deployment.spec.as_ref();
        let containers = spec
            .and_then(|s| s.template.spec.as_ref())
            .map(|pod| {
                pod.containers
                    .iter()
                    .map(|c| ContainerSpec {
                        name: c.name.clone(),
                        image: c.image.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: metadata.name.clone().unwrap_or_default(),
            namespace: metadata.namespace.clone(),
            replicas: spec.and_then(|s| s.replicas),
            containers,
            labels: metadata.labels.clone().unwrap_or_default(),
            document: Some(Box::new(deployment)),
        }
    }
}

impl WorkloadManifest {
    /// Whether the manifest was sent as a complete Deployment document.
    pub fn is_full_document(&self) -> bool {
        self.document.is_some()
    }

    /// Render the Deployment to submit to the control plane in `namespace`.
    pub fn to_deployment(&self, namespace: &str) -> Deployment {
        if let Some(document) = &self.document {
            let mut deployment = document.as_ref().clone();
            deployment.metadata.namespace = Some(namespace.to_string());
            return deployment;
        }

        let selector = self.selector_labels();
        let mut template_labels = self.labels.clone();
        template_labels.extend(selector.clone());

        Deployment {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(namespace.to_string()),
                labels: (!self.labels.is_empty()).then(|| self.labels.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: self.replicas,
                selector: LabelSelector {
                    match_labels: Some(selector),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(template_labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: self.render_containers(),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn selector_labels(&self) -> BTreeMap<String, String> {
        if self.labels.is_empty() {
            BTreeMap::from([(APP_LABEL.to_string(), self.name.clone())])
        } else {
            self.labels.clone()
        }
    }

    fn render_containers(&self) -> Vec<Container> {
        let single = self.containers.len() == 1;
        self.containers
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let name = match (spec.name.is_empty(), single) {
                    (false, _) => spec.name.clone(),
                    (true, true) => self.name.clone(),
                    (true, false) => format!("{}-{index}", self.name),
                };
                Container {
                    name,
                    image: Some(spec.image.clone()),
                    ..Default::default()
                }
            })
            .collect()
    }
}
