//! Shared API type definitions
//!
//! This crate contains the wire types exchanged by the workload gateway and its
//! clients: pod status projections, admin login responses and user records.

use serde::Deserialize;
use serde::Serialize;

/// Lifecycle phase of a pod as reported by the control plane.
///
/// Any phase the control plane reports outside of the four known values is
/// represented as [`PodPhase::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    /// Map a raw phase string onto the closed set of phases.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Minimal, stable view of a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodStatus {
    /// Pod name
    pub name: String,
    /// Pod phase
    #[serde(rename = "status")]
    pub phase: PodPhase,
    /// Creation timestamp in RFC 3339 form, empty when the control plane did not report one
    #[serde(rename = "createTime")]
    pub created_at: String,
}

/// Account summary returned by a successful admin login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub username: String,
    pub email: String,
}

/// Response for admin login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Always `"OK"` on success
    pub status: String,
    /// Issued session token, also set as the `session_id` cookie
    pub session_id: String,
    pub data: LoginData,
}

/// Response for a session check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub status: String,
    pub username: String,
}

/// User record as exposed over the API. Passwords are accepted on input but
/// never serialized back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque identifier assigned by the store
    #[serde(default)]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    /// `1` marks an administrator
    #[serde(default)]
    pub role: i32,
}

/// Response for the user count endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_phase_strings_map_to_unknown() {
        assert_eq!(PodPhase::from_raw("Running"), PodPhase::Running);
        assert_eq!(PodPhase::from_raw("running"), PodPhase::Unknown);
        assert_eq!(PodPhase::from_raw("CrashLoopBackOff"), PodPhase::Unknown);
        assert_eq!(PodPhase::from_raw(""), PodPhase::Unknown);
    }

    #[test]
    fn pod_status_uses_external_field_names() {
        let status = PodStatus {
            name: "web-0".to_string(),
            phase: PodPhase::Running,
            created_at: "2024-05-01T08:30:00Z".to_string(),
        };

        let json = serde_json::to_value(&status).expect("should serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "web-0",
                "status": "Running",
                "createTime": "2024-05-01T08:30:00Z"
            })
        );
    }

    #[test]
    fn user_record_never_serializes_password() {
        let user: UserRecord = serde_json::from_str(
            r#"{"username":"alice","password":"s3cret","email":"a@example.com","role":1}"#,
        )
        .expect("should deserialize");
        assert_eq!(user.password, "s3cret");
        assert_eq!(user.id, "");

        let json = serde_json::to_string(&user).expect("should serialize");
        assert!(!json.contains("s3cret"), "password leaked: {json}");
    }
}
