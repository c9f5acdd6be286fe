//! Authenticity verdicts over tool output text.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::VerifyConfig;
use crate::error::VerifyError;
use crate::pattern::PatternSet;
use crate::tracker::VerdictTracker;

/// Confidence subtracted per distinct matched indicator.
pub const CONFIDENCE_PENALTY: f64 = 0.3;

/// Distinct matches required for [`Verdict::LikelyFabricated`] in normal mode.
pub const FABRICATED_CUTOFF: usize = 2;

/// Distinct matches required for [`Verdict::LikelyFabricated`] in strict mode.
pub const STRICT_FABRICATED_CUTOFF: usize = 1;

/// Categorical authenticity judgment for a piece of tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyGenuine,
    Uncertain,
    LikelyFabricated,
}

impl Verdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LikelyGenuine => "likely_genuine",
            Self::Uncertain => "uncertain",
            Self::LikelyFabricated => "likely_fabricated",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking one text: verdict, confidence in `[0, 1]`, and the
/// matched indicator strings.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub verdict: Verdict,
    pub confidence: f64,
    pub indicators: Vec<String>,
}

/// Pattern-based authenticity checker for tool output.
///
/// Immutable after construction: [`AuthenticityChecker::check`] takes `&self`
/// and owns no interior state, so sharing an instance across threads is safe
/// by construction. The attached [`VerdictTracker`], if any, carries its own
/// lock; the checker itself provides no synchronization, so callers that need
/// isolation should use one instance per thread.
#[derive(Debug, Clone)]
pub struct AuthenticityChecker {
    patterns: PatternSet,
    strict: bool,
    tracker: Option<Arc<VerdictTracker>>,
}

impl AuthenticityChecker {
    #[must_use]
    pub fn new(patterns: PatternSet, strict: bool) -> Self {
        Self {
            patterns,
            strict,
            tracker: None,
        }
    }

    /// Built-in pattern list, normal mode.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(PatternSet::builtin(), false)
    }

    /// Build a checker from configuration.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError` when a configured pattern is malformed.
    pub fn from_config(config: &VerifyConfig) -> Result<Self, VerifyError> {
        let patterns = PatternSet::from_overrides(&config.patterns)?;
        Ok(Self::new(patterns, config.strict))
    }

    /// Attach a verdict tracker that will be notified of every check.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<VerdictTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Compute an assessment without notifying the tracker.
    ///
    /// Confidence is `max(0, 1 - CONFIDENCE_PENALTY * distinct_matches)`:
    /// deterministic and non-increasing as more patterns match.
    #[must_use]
    pub fn assess(&self, text: &str) -> Assessment {
        let indicators = self.patterns.scan(text);
        let verdict = self.classify(indicators.len());
        #[allow(clippy::cast_precision_loss)]
        let confidence = (1.0 - CONFIDENCE_PENALTY * indicators.len() as f64).max(0.0);
        Assessment {
            verdict,
            confidence,
            indicators,
        }
    }

    /// Check a text and report the outcome to the tracker, if attached.
    #[must_use]
    pub fn check(&self, text: &str) -> Assessment {
        self.check_labeled("unlabeled", text)
    }

    /// Like [`AuthenticityChecker::check`], recording `label` (typically the
    /// tool name) with the tracked verdict.
    #[must_use]
    pub fn check_labeled(&self, label: &str, text: &str) -> Assessment {
        let assessment = self.assess(text);
        self.report(label, &assessment);
        assessment
    }

    /// Notify the attached tracker of an assessment. Tracker failures are
    /// swallowed and logged at debug level; they never reach the caller.
    pub fn report(&self, label: &str, assessment: &Assessment) {
        if let Some(tracker) = &self.tracker {
            tracker.record(label, assessment);
        }
    }

    fn classify(&self, matches: usize) -> Verdict {
        let cutoff = if self.strict {
            STRICT_FABRICATED_CUTOFF
        } else {
            FABRICATED_CUTOFF
        };
        if matches >= cutoff {
            Verdict::LikelyFabricated
        } else if matches > 0 {
            Verdict::Uncertain
        } else {
            Verdict::LikelyGenuine
        }
    }
}

/// Execute a callable and check its textual result with a default checker.
pub fn verify_call<F>(label: &str, call: F) -> (String, Assessment)
where
    F: FnOnce() -> String,
{
    verify_call_with(&AuthenticityChecker::with_defaults(), label, call)
}

/// Execute a callable and check its textual result with a caller-supplied
/// checker.
pub fn verify_call_with<F>(
    checker: &AuthenticityChecker,
    label: &str,
    call: F,
) -> (String, Assessment)
where
    F: FnOnce() -> String,
{
    let output = call();
    let assessment = checker.check_labeled(label, &output);
    (output, assessment)
}
