//! Fabrication pattern compilation and scanning.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::VerifyError;

/// Built-in fabrication indicators.
///
/// Fabricated tool results tend to narrate success ("I have successfully
/// created...") instead of reporting concrete artifacts the way real
/// executions do. Patterns are matched case-insensitively as regexes, so
/// plain phrases work as substrings.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "i have successfully",
    "has been written to disk",
    "saved successfully",
    "the file has been created",
    "operation completed successfully",
    "successfully obtained",
    "returned comprehensive results",
    r"i found \d+ relevant",
    "would have been",
    "simulated",
];

static BUILTIN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DEFAULT_PATTERNS
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .unwrap()
        })
        .collect()
});

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

/// Ordered set of compiled case-insensitive fabrication patterns.
///
/// Retains the original pattern strings so matches can be surfaced verbatim
/// in diagnostics.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// The built-in default pattern list. Never fails.
    #[must_use]
    pub fn builtin() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .zip(BUILTIN.iter())
            .map(|(source, regex)| CompiledPattern {
                source: (*source).to_owned(),
                regex: regex.clone(),
            })
            .collect();
        Self { patterns }
    }

    /// Compile user-supplied patterns, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::EmptyPatternSet` for an empty list and
    /// `VerifyError::InvalidPattern` for a malformed regex, so configuration
    /// problems surface at construction rather than at scan time.
    pub fn compile(patterns: &[String]) -> Result<Self, VerifyError> {
        if patterns.is_empty() {
            return Err(VerifyError::EmptyPatternSet);
        }

        let mut compiled = Vec::with_capacity(patterns.len());
        for source in patterns {
            let regex = RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .map_err(|e| VerifyError::InvalidPattern {
                    pattern: source.clone(),
                    source: e,
                })?;
            compiled.push(CompiledPattern {
                source: source.clone(),
                regex,
            });
        }

        Ok(Self { patterns: compiled })
    }

    /// Compile overrides, falling back to [`PatternSet::builtin`] when the
    /// list is empty (i.e. no custom patterns were provided).
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::InvalidPattern` when an override is malformed.
    pub fn from_overrides(patterns: &[String]) -> Result<Self, VerifyError> {
        if patterns.is_empty() {
            Ok(Self::builtin())
        } else {
            Self::compile(patterns)
        }
    }

    /// Scan `text` and return every matched pattern string.
    ///
    /// Each configured pattern is reported at most once per scan regardless
    /// of how many times it occurs in the text, in configured order, so
    /// repeated scans of the same input are identical.
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| p.source.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
