//! Input validation for anything that reaches a privileged call
//!
//! Process and thread IDs come from directory names under the process tree and
//! name patterns come from the tuning plan. Both are checked here before they
//! are used to build paths, compile expressions or address a syscall.

use super::Tid;
use std::path::{Path, PathBuf};

/// IDs at or above this value are rejected
pub const DEFAULT_ID_CEILING: Tid = 99_999;

/// Patterns must be strictly shorter than this many characters
pub const MAX_PATTERN_LEN: usize = 100;

/// Characters never allowed in a name pattern
pub const FORBIDDEN_PATTERN_CHARS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '{', '}', '[', ']', '<', '>',
];

/// Strip everything that is not an ASCII digit
pub fn sanitize_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse a directory name as a numeric ID
///
/// Names with any non-digit character (`self`, `thread-self`, `1a`) are not
/// process entries and yield `None`, as do values that overflow [`Tid`].
pub fn parse_id(name: &str) -> Option<Tid> {
    let digits = sanitize_digits(name);
    if digits.is_empty() || digits.len() != name.len() {
        return None;
    }
    digits.parse().ok()
}

/// Check a name pattern: bounded length and no shell metacharacters
///
/// The pattern never reaches a shell; the character blacklist is kept anyway
/// and also rules out the grouping and alternation constructs that make
/// expressions expensive.
pub fn is_valid_pattern(pattern: &str) -> bool {
    pattern.chars().count() < MAX_PATTERN_LEN && !pattern.contains(FORBIDDEN_PATTERN_CHARS)
}

/// Validates IDs against a live process tree
#[derive(Debug, Clone)]
pub struct Sanitizer {
    proc_root: PathBuf,
    id_ceiling: Tid,
}

impl Sanitizer {
    /// Create a sanitizer for the process tree mounted at `proc_root`
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            id_ceiling: DEFAULT_ID_CEILING,
        }
    }

    /// Override the exclusive upper bound for IDs
    pub fn with_id_ceiling(mut self, ceiling: Tid) -> Self {
        self.id_ceiling = ceiling;
        self
    }

    /// Root of the process tree
    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    /// Exclusive upper bound for IDs
    pub fn id_ceiling(&self) -> Tid {
        self.id_ceiling
    }

    /// True if `id` is in range and has an entry in the process tree right now
    ///
    /// This is a point-in-time answer. The process may exit immediately after
    /// the check and callers must treat a later failure on the same ID as an
    /// ordinary transient error.
    pub fn is_valid_pid(&self, id: Tid) -> bool {
        self.in_range(id) && self.proc_root.join(id.to_string()).exists()
    }

    /// Range check only, without touching the filesystem
    pub fn in_range(&self, id: Tid) -> bool {
        id > 0 && id < self.id_ceiling
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new("/proc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_digits() {
        assert_eq!(sanitize_digits("12a3"), "123");
        assert_eq!(sanitize_digits("  42\n"), "42");
        assert_eq!(sanitize_digits("self"), "");
        assert_eq!(sanitize_digits(""), "");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1234"), Some(1234));
        assert_eq!(parse_id("self"), None);
        assert_eq!(parse_id("12a"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("99999999999999"), None);
    }

    #[test]
    fn test_pattern_validation() {
        assert!(is_valid_pattern("zygote"));
        assert!(is_valid_pattern("kgsl_worker_thread"));
        assert!(is_valid_pattern("^surface.*"));
        assert!(is_valid_pattern(""));
        assert!(!is_valid_pattern("zygote; rm -rf /"));
        assert!(!is_valid_pattern("a|b"));
        assert!(!is_valid_pattern("$(id)"));
        assert!(!is_valid_pattern(&"a".repeat(100)));
        assert!(is_valid_pattern(&"a".repeat(99)));
    }

    #[test]
    fn test_pid_validation() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("321")).unwrap();
        let sanitizer = Sanitizer::new(dir.path());

        assert!(sanitizer.is_valid_pid(321));
        assert!(!sanitizer.is_valid_pid(322));
        assert!(!sanitizer.is_valid_pid(0));
        assert!(!sanitizer.is_valid_pid(-5));
    }

    #[test]
    fn test_pid_ceiling() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("99999")).unwrap();
        std::fs::create_dir(dir.path().join("99998")).unwrap();

        let sanitizer = Sanitizer::new(dir.path());
        assert!(!sanitizer.is_valid_pid(99_999));
        assert!(sanitizer.is_valid_pid(99_998));

        let raised = sanitizer.with_id_ceiling(4_194_304);
        assert!(raised.is_valid_pid(99_999));
    }

    proptest! {
        #[test]
        fn rejects_any_forbidden_char(
            prefix in "[a-z_]{0,40}",
            idx in 0usize..FORBIDDEN_PATTERN_CHARS.len(),
            suffix in "[a-z_]{0,40}",
        ) {
            let pattern = format!("{}{}{}", prefix, FORBIDDEN_PATTERN_CHARS[idx], suffix);
            prop_assert!(!is_valid_pattern(&pattern));
        }

        #[test]
        fn accepts_short_clean_patterns(pattern in "[a-zA-Z0-9_.*^ -]{0,99}") {
            prop_assert!(is_valid_pattern(&pattern));
        }

        #[test]
        fn rejects_long_patterns(pattern in "[a-z]{100,160}") {
            prop_assert!(!is_valid_pattern(&pattern));
        }
    }
}
