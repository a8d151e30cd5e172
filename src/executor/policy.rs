//! Error-classification policy
//!
//! Some commands are teardown idioms that fail when the system is already in
//! the desired state: killing a process that is not running, force-removing a
//! missing file, stopping a stopped unit. Their failures do not abort the
//! pipeline.

/// Substrings of the configured command text that mark a failure ignorable
///
/// Matching is case-sensitive and done on the raw text, never on the error.
pub const IGNORABLE_PATTERNS: &[&str] = &["kill", "pkill", "rm -f", "systemctl stop"];

/// Returns true if a failure of `command` should not abort the pipeline
///
/// Only consulted for commands that ran and reported a failed status. Spawn
/// and transport failures are always fatal.
#[must_use]
pub fn is_ignorable(command: &str) -> bool {
    IGNORABLE_PATTERNS
        .iter()
        .any(|pattern| command.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_teardown_idioms_are_ignorable() {
        assert!(is_ignorable("kill $(cat /var/run/app.pid)"));
        assert!(is_ignorable("pkill -f myapp"));
        assert!(is_ignorable("rm -f /tmp/app.sock"));
        assert!(is_ignorable("sudo systemctl stop nginx"));
    }

    #[test]
    fn test_other_commands_are_fatal() {
        assert!(!is_ignorable("deploy.sh"));
        assert!(!is_ignorable("rm -rf /srv/app/old"));
        assert!(!is_ignorable("systemctl restart nginx"));
        assert!(!is_ignorable(""));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(!is_ignorable("KILL app"));
        assert!(!is_ignorable("RM -F /tmp/x"));
        assert!(!is_ignorable("systemctl STOP nginx"));
    }

    #[test]
    fn test_matching_is_substring_based() {
        // "skill" contains "kill".
        assert!(is_ignorable("./skill-check"));
        assert!(is_ignorable("rm -fr /tmp/cache"));
    }

    proptest! {
        #[test]
        fn prop_classification_is_pure(text in ".*") {
            prop_assert_eq!(is_ignorable(&text), is_ignorable(&text));
        }

        #[test]
        fn prop_any_pattern_makes_text_ignorable(
            prefix in "[a-z ]{0,12}",
            suffix in "[a-z/ ]{0,12}",
            idx in 0..IGNORABLE_PATTERNS.len(),
        ) {
            let text = format!("{prefix}{}{suffix}", IGNORABLE_PATTERNS[idx]);
            prop_assert!(is_ignorable(&text));
        }

        #[test]
        fn prop_text_without_patterns_is_fatal(text in "[a-jA-Z0-9 ._/-]{0,40}") {
            // No 'k', so neither kill pattern; "rm -f" and "systemctl stop"
            // need letters beyond 'j'.
            prop_assert!(!is_ignorable(&text));
        }
    }
}
