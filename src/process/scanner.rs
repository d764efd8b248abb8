//! Process and thread discovery under a procfs tree
//!
//! Entries in the process tree come and go while we read it. Anything that
//! disappears or cannot be read is skipped; only an unreadable root is
//! reported, and even then the caller just gets an empty list.

use crate::error::TuneError;
use crate::system::{is_valid_pattern, parse_id, Sanitizer, Tid};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds processes by command name and lists their threads
#[derive(Debug, Clone)]
pub struct ProcessScanner {
    sanitizer: Sanitizer,
}

impl ProcessScanner {
    /// Scanner over the tree the sanitizer validates against
    pub fn new(sanitizer: Sanitizer) -> Self {
        Self { sanitizer }
    }

    /// Root of the process tree
    pub fn proc_root(&self) -> &Path {
        self.sanitizer.proc_root()
    }

    /// Sanitizer used for ID checks
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// IDs of live processes whose command name matches `pattern`
    ///
    /// The pattern is a regular expression searched anywhere in `comm`.
    /// Rejected or uncompilable patterns yield an empty list.
    pub fn find_processes(&self, pattern: &str) -> Vec<Tid> {
        if !is_valid_pattern(pattern) {
            tracing::error!("{}", TuneError::InvalidPattern(pattern.to_string()));
            return Vec::new();
        }

        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                let err = TuneError::Pattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                };
                tracing::error!("{}", err);
                return Vec::new();
            }
        };

        let Some(entries) = numeric_entries(self.proc_root(), Listing::Root) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter(|(pid, _)| self.sanitizer.is_valid_pid(*pid))
            .filter_map(|(pid, path)| {
                let comm = read_comm(&path)?;
                regex.is_match(&comm).then_some(pid)
            })
            .collect()
    }

    /// IDs of the live threads of `pid`
    pub fn find_threads(&self, pid: Tid) -> Vec<Tid> {
        if !self.sanitizer.is_valid_pid(pid) {
            return Vec::new();
        }

        let task_dir = self.proc_root().join(pid.to_string()).join("task");
        let Some(entries) = numeric_entries(&task_dir, Listing::Tasks) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .map(|(tid, _)| tid)
            .filter(|tid| self.sanitizer.is_valid_pid(*tid))
            .collect()
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new(Sanitizer::default())
    }
}

/// Which directory is being listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    /// The process tree itself
    Root,
    /// `<pid>/task`, which disappears with its process
    Tasks,
}

/// Numeric directory entries directly under `dir`
///
/// Returns `None` if `dir` itself cannot be listed.
fn numeric_entries(dir: &Path, listing: Listing) -> Option<Vec<(Tid, PathBuf)>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        match entry {
            Ok(e) => {
                if !e.file_type().is_dir() {
                    continue;
                }
                let Some(id) = e.file_name().to_str().and_then(parse_id) else {
                    continue;
                };
                entries.push((id, e.into_path()));
            }
            Err(err) if err.depth() == 0 => {
                let vanished = listing == Listing::Tasks
                    && err
                        .io_error()
                        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
                        .unwrap_or(false);
                if vanished {
                    tracing::debug!("{} vanished before it could be listed", dir.display());
                } else {
                    tracing::error!("Error listing {}: {}", dir.display(), err);
                }
                return None;
            }
            Err(err) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", dir.display(), err);
            }
        }
    }

    Some(entries)
}

/// First line of `<entry>/comm`, or `None` if the process went away
fn read_comm(entry: &Path) -> Option<String> {
    let content = std::fs::read_to_string(entry.join("comm")).ok()?;
    Some(content.lines().next().unwrap_or("").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CapturedLogs, FakeProcTree};

    fn sorted(mut ids: Vec<Tid>) -> Vec<Tid> {
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_find_processes_by_substring() {
        let tree = FakeProcTree::new();
        tree.add_process(10, "zygote64", &[10]);
        tree.add_process(11, "zygote", &[11]);
        tree.add_process(12, "surfaceflinger", &[12]);
        let scanner = tree.scanner();

        assert_eq!(sorted(scanner.find_processes("zygote")), vec![10, 11]);
        assert_eq!(scanner.find_processes("surface"), vec![12]);
        assert!(scanner.find_processes("nonexistent_task_xyz").is_empty());
    }

    #[test]
    fn test_find_processes_regex() {
        let tree = FakeProcTree::new();
        tree.add_process(20, "crtc_commit:111", &[20]);
        tree.add_process(21, "crtc_event:111", &[21]);
        tree.add_process(22, "kworker/u16:2", &[22]);
        let scanner = tree.scanner();

        assert_eq!(sorted(scanner.find_processes("^crtc_.*:111")), vec![20, 21]);
        assert_eq!(scanner.find_processes("^kworker/u"), vec![22]);
    }

    #[test]
    fn test_skips_non_numeric_and_vanished_entries() {
        let tree = FakeProcTree::new();
        tree.add_process(30, "zygote", &[30]);
        std::fs::create_dir(tree.root().join("self")).unwrap();
        std::fs::write(tree.root().join("self/comm"), "zygote\n").unwrap();
        // Process directory without comm, as if it exited mid-scan
        std::fs::create_dir(tree.root().join("31")).unwrap();
        // Plain file with a numeric name
        std::fs::write(tree.root().join("32"), "").unwrap();

        assert_eq!(tree.scanner().find_processes("zygote"), vec![30]);
    }

    #[test]
    fn test_rejects_invalid_pattern() {
        let tree = FakeProcTree::new();
        tree.add_process(40, "zygote", &[40]);
        let logs = CapturedLogs::new();

        let found = logs.capture(|| tree.scanner().find_processes("zygote;reboot"));

        assert!(found.is_empty());
        assert!(logs.contents().contains("Invalid pattern: zygote;reboot"));
    }

    #[test]
    fn test_uncompilable_pattern_is_empty() {
        let tree = FakeProcTree::new();
        tree.add_process(41, "zygote", &[41]);

        assert!(tree.scanner().find_processes("*zygote").is_empty());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tree = FakeProcTree::new();
        let scanner = ProcessScanner::new(Sanitizer::new(tree.root().join("missing")));
        let logs = CapturedLogs::new();

        assert!(logs.capture(|| scanner.find_processes("zygote")).is_empty());
        assert_eq!(logs.count("ERROR"), 1);
        assert!(logs.contents().contains("Error listing"));
    }

    #[test]
    fn test_find_threads() {
        let tree = FakeProcTree::new();
        tree.add_process(50, "system_server", &[50, 51, 52]);
        let scanner = tree.scanner();

        assert_eq!(sorted(scanner.find_threads(50)), vec![50, 51, 52]);
    }

    #[test]
    fn test_find_threads_skips_dead_threads() {
        let tree = FakeProcTree::new();
        tree.add_process(60, "system_server", &[60, 61]);
        // Listed under task/ but already gone from the top level
        std::fs::create_dir(tree.root().join("60/task/62")).unwrap();

        assert_eq!(sorted(tree.scanner().find_threads(60)), vec![60, 61]);
    }

    #[test]
    fn test_find_threads_of_invalid_process() {
        let tree = FakeProcTree::new();
        let scanner = tree.scanner();

        assert!(scanner.find_threads(70).is_empty());
        assert!(scanner.find_threads(0).is_empty());
        assert!(scanner.find_threads(-1).is_empty());
    }

    #[test]
    fn test_find_threads_without_task_dir() {
        let tree = FakeProcTree::new();
        std::fs::create_dir(tree.root().join("80")).unwrap();
        let logs = CapturedLogs::new();

        assert!(logs.capture(|| tree.scanner().find_threads(80)).is_empty());
        assert_eq!(logs.count("ERROR"), 0);
        assert!(logs.contents().contains("vanished"));
    }
}
