//! Filesystem evidence gathering around a tool execution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use serde::Serialize;

use crate::checker::{Assessment, AuthenticityChecker, Verdict};

/// Default bound on how many directory levels a snapshot descends.
pub const DEFAULT_SCAN_DEPTH: usize = 2;

/// Side-channel evidence collected around one execution.
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    /// Files added, removed, or modified under the monitored root.
    pub filesystem_changes: usize,
    pub duration_ms: u64,
}

/// Text assessment plus execution evidence for one tool run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionCertificate {
    pub label: String,
    pub assessment: Assessment,
    pub evidence: Evidence,
}

impl ExecutionCertificate {
    #[must_use]
    pub fn is_fabricated(&self) -> bool {
        self.assessment.verdict == Verdict::LikelyFabricated
    }

    #[must_use]
    pub fn is_genuine(&self) -> bool {
        self.assessment.verdict == Verdict::LikelyGenuine
    }
}

#[derive(Debug)]
struct Baseline {
    files: HashMap<PathBuf, SystemTime>,
    started: Instant,
}

/// Watches a directory tree across a tool execution and combines the
/// filesystem diff with the text heuristic.
///
/// `scan_depth` bounds the snapshot recursion: depth 1 covers only files
/// directly under the root, depth 2 one level of subdirectories, and so on.
/// Unreadable entries are skipped, never an error.
///
/// Not synchronized internally; use one monitor per execution.
#[derive(Debug)]
pub struct ExecutionMonitor {
    checker: AuthenticityChecker,
    root: PathBuf,
    scan_depth: usize,
    baseline: Option<Baseline>,
}

impl ExecutionMonitor {
    #[must_use]
    pub fn new(checker: AuthenticityChecker, root: impl Into<PathBuf>, scan_depth: usize) -> Self {
        Self {
            checker,
            root: root.into(),
            scan_depth,
            baseline: None,
        }
    }

    /// Snapshot the monitored root and start timing. Call immediately before
    /// executing the tool.
    pub fn start(&mut self) {
        self.baseline = Some(Baseline {
            files: snapshot(&self.root, self.scan_depth),
            started: Instant::now(),
        });
    }

    /// Re-snapshot, diff against the baseline, and assess `output`.
    ///
    /// When text indicators matched but the filesystem actually changed
    /// during the execution, the verdict is softened one step
    /// (`LikelyFabricated` becomes `Uncertain`); confidence is left as the
    /// text heuristic computed it. Without a prior [`ExecutionMonitor::start`]
    /// the certificate carries zero evidence.
    pub fn finish(&mut self, label: &str, output: &str) -> ExecutionCertificate {
        let evidence = match self.baseline.take() {
            Some(baseline) => {
                let after = snapshot(&self.root, self.scan_depth);
                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = baseline.started.elapsed().as_millis() as u64;
                Evidence {
                    filesystem_changes: count_changes(&baseline.files, &after),
                    duration_ms,
                }
            }
            None => Evidence {
                filesystem_changes: 0,
                duration_ms: 0,
            },
        };

        let mut assessment = self.checker.assess(output);
        if evidence.filesystem_changes > 0 && assessment.verdict == Verdict::LikelyFabricated {
            tracing::debug!(
                changes = evidence.filesystem_changes,
                "filesystem evidence softens text verdict"
            );
            assessment.verdict = Verdict::Uncertain;
        }
        self.checker.report(label, &assessment);

        ExecutionCertificate {
            label: label.to_owned(),
            assessment,
            evidence,
        }
    }
}

fn snapshot(root: &Path, depth: usize) -> HashMap<PathBuf, SystemTime> {
    let mut files = HashMap::new();
    collect(root, depth, &mut files);
    files
}

fn collect(dir: &Path, depth: usize, files: &mut HashMap<PathBuf, SystemTime>) {
    if depth == 0 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        let path = entry.path();
        if meta.is_dir() {
            collect(&path, depth - 1, files);
        } else if let Ok(mtime) = meta.modified() {
            files.insert(path, mtime);
        }
    }
}

fn count_changes(
    before: &HashMap<PathBuf, SystemTime>,
    after: &HashMap<PathBuf, SystemTime>,
) -> usize {
    let added_or_modified = after
        .iter()
        .filter(|(path, mtime)| before.get(*path) != Some(mtime))
        .count();
    let removed = before.keys().filter(|p| !after.contains_key(*p)).count();
    added_or_modified + removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSet;

    fn strict_checker(patterns: &[&str]) -> AuthenticityChecker {
        let patterns: Vec<String> = patterns.iter().map(|s| (*s).to_owned()).collect();
        AuthenticityChecker::new(PatternSet::compile(&patterns).unwrap(), true)
    }

    #[test]
    fn fabricated_text_without_changes_stays_fabricated() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 2);
        monitor.start();
        let cert = monitor.finish("fake_writer", "File saved.");
        assert!(cert.is_fabricated());
        assert_eq!(cert.evidence.filesystem_changes, 0);
    }

    #[test]
    fn filesystem_changes_soften_fabricated_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 2);
        monitor.start();
        std::fs::write(dir.path().join("out.txt"), "data").unwrap();
        let cert = monitor.finish("real_writer", "File saved.");
        assert_eq!(cert.assessment.verdict, Verdict::Uncertain);
        assert_eq!(cert.evidence.filesystem_changes, 1);
    }

    #[test]
    fn genuine_text_with_changes_stays_genuine() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 2);
        monitor.start();
        std::fs::write(dir.path().join("out.txt"), "data").unwrap();
        let cert = monitor.finish("real_writer", "wrote 4 bytes to out.txt");
        assert!(cert.is_genuine());
        assert!((cert.assessment.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn removed_file_counts_as_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("victim.txt");
        std::fs::write(&path, "data").unwrap();
        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 2);
        monitor.start();
        std::fs::remove_file(&path).unwrap();
        let cert = monitor.finish("deleter", "removed victim.txt");
        assert_eq!(cert.evidence.filesystem_changes, 1);
    }

    #[test]
    fn scan_depth_bounds_recursion() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();

        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 1);
        monitor.start();
        std::fs::write(sub.join("deep.txt"), "data").unwrap();
        let cert = monitor.finish("deep_writer", "wrote deep.txt");
        // Depth 1 only sees files directly under the root.
        assert_eq!(cert.evidence.filesystem_changes, 0);
    }

    #[test]
    fn finish_without_start_yields_zero_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 2);
        let cert = monitor.finish("unstarted", "File saved.");
        assert_eq!(cert.evidence.filesystem_changes, 0);
        assert_eq!(cert.evidence.duration_ms, 0);
        assert!(cert.is_fabricated());
    }

    #[test]
    fn nonexistent_root_is_not_an_error() {
        let mut monitor = ExecutionMonitor::new(
            strict_checker(&["saved"]),
            "/nonexistent/attest/root",
            2,
        );
        monitor.start();
        let cert = monitor.finish("ghost", "nothing happened");
        assert_eq!(cert.evidence.filesystem_changes, 0);
    }

    #[test]
    fn tracker_sees_softened_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = std::sync::Arc::new(crate::tracker::VerdictTracker::default());
        let checker = strict_checker(&["saved"]).with_tracker(tracker.clone());
        let mut monitor = ExecutionMonitor::new(checker, dir.path(), 2);
        monitor.start();
        std::fs::write(dir.path().join("out.txt"), "data").unwrap();
        let _ = monitor.finish("real_writer", "File saved.");

        let history = tracker.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].verdict, Verdict::Uncertain);
    }

    #[test]
    fn certificate_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = ExecutionMonitor::new(strict_checker(&["saved"]), dir.path(), 2);
        monitor.start();
        let cert = monitor.finish("writer", "File saved.");
        let json = serde_json::to_string(&cert).unwrap();
        assert!(json.contains("\"filesystem_changes\":0"));
        assert!(json.contains("\"label\":\"writer\""));
    }
}
