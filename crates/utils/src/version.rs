use std::sync::LazyLock;

use crate::build_info::BUILD_INFO;

/// Application version: `<image version>-<short commit>[-dirty]`.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    compose(
        env!("IMAGE_VERSION"),
        BUILD_INFO.commit_sha1,
        is_dirty(BUILD_INFO.git_dirty),
    )
});

fn is_dirty(git_dirty: Option<&str>) -> bool {
    git_dirty == Some("true")
}

fn compose(image_version: &str, commit_sha1: Option<&str>, dirty: bool) -> String {
    let commit = commit_sha1
        .map(|sha| sha.get(..8).unwrap_or(sha))
        .unwrap_or("unknown");
    let suffix = if dirty { "-dirty" } else { "" };
    format!("{image_version}-{commit}{suffix}")
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn version_uses_short_commit() {
        assert_eq!(
            compose("1.2.0", Some("0123456789abcdef"), false),
            "1.2.0-01234567"
        );
        assert_eq!(compose("latest", Some("abc"), true), "latest-abc-dirty");
        assert_eq!(compose("latest", None, false), "latest-unknown");
    }

    #[test]
    fn only_true_marks_the_tree_dirty() {
        assert!(is_dirty(Some("true")));
        assert!(!is_dirty(Some("false")));
        assert!(!is_dirty(None));
        assert_eq!(
            compose("1.0.0", Some("abcdef0123"), is_dirty(Some("false"))),
            "1.0.0-abcdef01"
        );
    }
}
