//! Projection of control-plane pod records into [`PodStatus`].

use api_types::PodPhase;
use api_types::PodStatus;
use chrono::SecondsFormat;
use k8s_openapi::api::core::v1::Pod;

/// Project a raw pod record.
///
/// Never fails: a missing name or timestamp becomes an empty string and a
/// missing or unrecognised phase becomes [`PodPhase::Unknown`].
pub fn project(pod: &Pod) -> PodStatus {
    let phase = pod
        .status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .map(PodPhase::from_raw)
        .unwrap_or_default();

    let created_at = pod
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|time| time.0.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();

    PodStatus {
        name: pod.metadata.name.clone().unwrap_or_default(),
        phase,
        created_at,
    }
}

/// Project every record, keeping the control-plane order.
pub fn project_all(pods: &[Pod]) -> Vec<PodStatus> {
    pods.iter().map(project).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use k8s_openapi::api::core::v1::PodStatus as RawPodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use similar_asserts::assert_eq;

    use super::*;

    fn pod(name: &str, phase: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                creation_timestamp: Some(Time(
                    Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
                )),
                ..Default::default()
            },
            status: Some(RawPodStatus {
                phase: phase.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn projects_known_phase_and_timestamp() {
        let status = project(&pod("web-0", Some("Running")));

        assert_eq!(
            status,
            PodStatus {
                name: "web-0".to_string(),
                phase: PodPhase::Running,
                created_at: "2024-05-01T08:30:00Z".to_string(),
            }
        );
    }

    #[test]
    fn unknown_or_missing_phase_maps_to_unknown() {
        for phase in [Some("Evicted"), Some("running"), Some(""), None] {
            assert_eq!(
                project(&pod("web-0", phase)).phase,
                PodPhase::Unknown,
                "phase {phase:?} should be Unknown"
            );
        }

        let bare = Pod::default();
        let status = project(&bare);
        assert_eq!(status.phase, PodPhase::Unknown);
        assert_eq!(status.name, "");
        assert_eq!(status.created_at, "");
    }

    #[test]
    fn keeps_control_plane_order() {
        let pods = vec![
            pod("zeta", Some("Pending")),
            pod("alpha", Some("Succeeded")),
            pod("mid", Some("Failed")),
        ];

        let names: Vec<String> = project_all(&pods).into_iter().map(|s| s.name).collect();

        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
