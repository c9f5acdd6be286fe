use serde::Deserialize;

fn default_scan_depth() -> usize {
    2
}

/// Verification configuration: strictness, pattern overrides, and the
/// filesystem snapshot depth bound.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyConfig {
    /// Treat a single matched indicator as fabrication.
    #[serde(default)]
    pub strict: bool,
    /// Custom fabrication patterns. Empty means use the built-in list.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Directory levels the execution monitor descends when snapshotting.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            strict: false,
            patterns: Vec::new(),
            scan_depth: default_scan_depth(),
        }
    }
}
