//! Aggregation of verification outcomes across checks.

use std::sync::Mutex;

use serde::Serialize;

use crate::checker::{Assessment, Verdict};

/// One tracked verification outcome.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictRecord {
    pub label: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub indicators: Vec<String>,
}

/// Aggregate statistics over all tracked verdicts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerStats {
    pub total: usize,
    pub genuine: usize,
    pub uncertain: usize,
    pub fabricated: usize,
    pub fabrication_rate: f64,
}

/// Process-wide verdict aggregation.
///
/// Constructed by the caller and injected into checkers via
/// [`crate::AuthenticityChecker::with_tracker`], so the dependency stays
/// visible and testable rather than living in an ambient singleton. Shareable
/// across threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct VerdictTracker {
    records: Mutex<Vec<VerdictRecord>>,
}

impl VerdictTracker {
    /// Record one outcome. A poisoned lock drops the record with a debug log
    /// so reporting can never fail the verdict computation that triggered it.
    pub fn record(&self, label: &str, assessment: &Assessment) {
        match self.records.lock() {
            Ok(mut records) => records.push(VerdictRecord {
                label: label.to_owned(),
                verdict: assessment.verdict,
                confidence: assessment.confidence,
                indicators: assessment.indicators.clone(),
            }),
            Err(e) => {
                tracing::debug!("verdict tracker unavailable, dropping record: {e}");
            }
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> TrackerStats {
        let records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let total = records.len();
        let genuine = records
            .iter()
            .filter(|r| r.verdict == Verdict::LikelyGenuine)
            .count();
        let fabricated = records
            .iter()
            .filter(|r| r.verdict == Verdict::LikelyFabricated)
            .count();
        let fabrication_rate = if total == 0 {
            0.0
        } else {
            fabricated as f64 / total as f64
        };
        TrackerStats {
            total,
            genuine,
            uncertain: total - genuine - fabricated,
            fabricated,
            fabrication_rate,
        }
    }

    /// Snapshot of every tracked record, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<VerdictRecord> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}
