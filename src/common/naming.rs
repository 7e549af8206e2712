//! Per-run group and node naming
//!
//! Group and node names derive from the invoking user's identity plus a
//! random suffix in [0, 999) so concurrent runs do not collide on provider
//! resources. No state persists between runs.

use rand::Rng;

/// Label appended to generated names to mark harness-owned resources
const NAME_TAG: &str = "pvck";

/// Random suffix for one scenario run
pub fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(0..999)
}

/// The invoking user's identity, lowercased and stripped to alphanumerics
///
/// Reads `USER` (Unix) then `USERNAME` (Windows); falls back to a fixed
/// label so generated names are always valid.
pub fn user_name() -> String {
    let raw = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "provcheck".to_string());

    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if cleaned.is_empty() {
        "provcheck".to_string()
    } else {
        cleaned
    }
}

/// Group name for one scenario run, e.g. `alice42-group-pvck`
pub fn group_name(user: &str, suffix: u32) -> String {
    format!("{}{}-group-{}", user, suffix, NAME_TAG)
}

/// Node name for one scenario run, e.g. `alice42pvck`
///
/// Uses at most the first five characters of the user name, matching the
/// short-name constraints of provider-side hostnames.
pub fn node_name(user: &str, suffix: u32) -> String {
    let short: String = user.chars().take(5).collect();
    format!("{}{}{}", short, suffix, NAME_TAG)
}

/// Node names for a whole group. The first node carries the bare name;
/// the rest get an index so names stay unique within the group.
pub fn node_names(user: &str, suffix: u32, count: u32) -> Vec<String> {
    let base = node_name(user, suffix);
    (0..count)
        .map(|i| {
            if i == 0 {
                base.clone()
            } else {
                format!("{}-{}", base, i)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_bounded() {
        for _ in 0..100 {
            assert!(random_suffix() < 999);
        }
    }

    #[test]
    fn group_name_format() {
        assert_eq!(group_name("alice", 42), "alice42-group-pvck");
    }

    #[test]
    fn node_name_truncates_user() {
        assert_eq!(node_name("alexander", 7), "alexa7pvck");
        assert_eq!(node_name("bob", 7), "bob7pvck");
    }

    #[test]
    fn node_names_are_unique_within_group() {
        let names = node_names("alexander", 7, 3);
        assert_eq!(names, vec!["alexa7pvck", "alexa7pvck-1", "alexa7pvck-2"]);
    }

    #[test]
    fn user_name_is_sanitized() {
        // Whatever the environment provides, the result is name-safe
        let user = user_name();
        assert!(!user.is_empty());
        assert!(user.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn names_differ_across_suffixes() {
        assert_ne!(group_name("alice", 1), group_name("alice", 2));
    }
}
