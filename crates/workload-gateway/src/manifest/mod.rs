//! Workload manifest decoding.
//!
//! Manifests arrive as a YAML document carried inside a JSON string, either as
//! the whole request body (`"name: demo\n..."`) or as the `manifest` field of
//! a JSON object (`{"manifest": "name: demo\n..."}`). Decoding happens in two
//! stages and each stage reports its own [`ParseError`] variant, so that a
//! malformed request can be told apart from a malformed manifest.
//!
//! Two YAML shapes are accepted:
//!
//! - a flat shorthand with `name`, `namespace`, `replicas`, `image`,
//!   `containers` and `labels`;
//! - a complete `apps/v1` Deployment document (recognised by a `kind` or
//!   `metadata` key).
//!
//! Only structure is checked here. Field requirements such as a non-empty
//! name depend on the operation and are enforced by the controller.

use core::error::Error;

use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use serde::Deserialize;
use serde_yaml::Mapping;
use serde_yaml::Value;

mod types;

pub use types::ContainerSpec;
pub use types::WorkloadManifest;
pub use types::WorkloadRef;
pub use types::APP_LABEL;

use types::FlatManifest;

const DEPLOYMENT_KIND: &str = "Deployment";
const DEPLOYMENT_API_VERSION: &str = "apps/v1";
const DOCUMENT_KEYS: [&str; 2] = ["kind", "metadata"];

/// Decoding stage that rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ParseStage {
    #[display("envelope")]
    Envelope,
    #[display("manifest")]
    Manifest,
}

/// Manifest decoding errors
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ParseError {
    #[display("Malformed request envelope: {message}")]
    Envelope { message: String },
    #[display("Malformed workload manifest: {message}")]
    Manifest { message: String },
}

impl Error for ParseError {}

impl ParseError {
    pub fn stage(&self) -> ParseStage {
        match self {
            Self::Envelope { .. } => ParseStage::Envelope,
            Self::Manifest { .. } => ParseStage::Manifest,
        }
    }

    fn manifest(message: impl Into<String>) -> Report<Self> {
        Report::new(Self::Manifest {
            message: message.into(),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Bare(String),
    Wrapped { manifest: String },
}

/// Decode a request body into a complete workload manifest.
///
/// # Errors
///
/// - [`ParseError::Envelope`] if the body is not a JSON string or an object
///   with a string `manifest` field
/// - [`ParseError::Manifest`] if the carried text is not a valid manifest
pub fn parse(raw: &[u8]) -> Result<WorkloadManifest, Report<ParseError>> {
    parse_text(&unwrap_envelope(raw)?)
}

/// Decode manifest YAML that is not wrapped in a request envelope.
///
/// # Errors
///
/// - [`ParseError::Manifest`] if `text` is not a valid manifest
pub fn parse_text(text: &str) -> Result<WorkloadManifest, Report<ParseError>> {
    let document = decode_document(text)?;

    if is_deployment_document(&document) {
        return deployment_from_mapping(document).map(WorkloadManifest::from);
    }

    serde_yaml::from_value::<FlatManifest>(Value::Mapping(document))
        .map(WorkloadManifest::from)
        .map_err(|e| ParseError::manifest(e.to_string()))
}

/// Decode only the name and namespace of a workload from a request body.
///
/// Any other fields of the manifest are ignored, so the body of a create or
/// update request can be reused to delete the same workload.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_reference(raw: &[u8]) -> Result<WorkloadRef, Report<ParseError>> {
    let document = decode_document(&unwrap_envelope(raw)?)?;

    let source = match document.get("metadata") {
        Some(Value::Mapping(metadata)) => metadata,
        Some(Value::Null) | None => &document,
        Some(_) => return Err(ParseError::manifest("`metadata` must be a mapping")),
    };

    Ok(WorkloadRef {
        name: string_field(source, "name")?.unwrap_or_default(),
        namespace: string_field(source, "namespace")?,
    })
}

fn unwrap_envelope(raw: &[u8]) -> Result<String, Report<ParseError>> {
    let envelope: Envelope = serde_json::from_slice(raw).map_err(|e| {
        Report::new(ParseError::Envelope {
            message: e.to_string(),
        })
        .attach_printable("expected a JSON string or an object with a string `manifest` field")
    })?;

    Ok(match envelope {
        Envelope::Bare(manifest) | Envelope::Wrapped { manifest } => manifest,
    })
}

fn decode_document(text: &str) -> Result<Mapping, Report<ParseError>> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| ParseError::manifest(e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Err(ParseError::manifest("manifest is empty")),
        other => Err(ParseError::manifest(format!(
            "manifest must be a mapping, found {}",
            value_kind(&other)
        ))),
    }
}

fn is_deployment_document(document: &Mapping) -> bool {
    DOCUMENT_KEYS.iter().any(|key| document.contains_key(*key))
}

fn deployment_from_mapping(mut document: Mapping) -> Result<Deployment, Report<ParseError>> {
    match string_field(&document, "kind")? {
        Some(kind) if kind != DEPLOYMENT_KIND => {
            return Err(ParseError::manifest(format!(
                "unsupported kind `{kind}`, expected `{DEPLOYMENT_KIND}`"
            )));
        }
        Some(_) => {}
        None => {
            document.insert("kind".into(), DEPLOYMENT_KIND.into());
        }
    }

    match string_field(&document, "apiVersion")? {
        Some(version) if version != DEPLOYMENT_API_VERSION => {
            return Err(ParseError::manifest(format!(
                "unsupported apiVersion `{version}`, expected `{DEPLOYMENT_API_VERSION}`"
            )));
        }
        Some(_) => {}
        None => {
            document.insert("apiVersion".into(), DEPLOYMENT_API_VERSION.into());
        }
    }

    serde_yaml::from_value(Value::Mapping(document))
        .map_err(|e| ParseError::manifest(e.to_string()))
}

fn string_field(mapping: &Mapping, key: &str) -> Result<Option<String>, Report<ParseError>> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(ParseError::manifest(format!(
            "`{key}` must be a string, found {}",
            value_kind(other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
