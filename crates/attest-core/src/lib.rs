//! Heuristic authenticity verification for tool execution output.
//!
//! Agents sometimes narrate a tool call instead of making one. This crate
//! scores a tool's reported textual result against a configurable set of
//! fabrication patterns and returns a verdict, a confidence score, and the
//! matched indicators. An optional [`ExecutionMonitor`] adds filesystem
//! evidence gathered around the execution, and a [`VerdictTracker`] can be
//! injected to aggregate outcomes across checks.

pub mod checker;
pub mod config;
pub mod error;
pub mod monitor;
pub mod pattern;
pub mod tracker;

pub use checker::{
    Assessment, AuthenticityChecker, CONFIDENCE_PENALTY, FABRICATED_CUTOFF,
    STRICT_FABRICATED_CUTOFF, Verdict, verify_call, verify_call_with,
};
pub use config::VerifyConfig;
pub use error::VerifyError;
pub use monitor::{DEFAULT_SCAN_DEPTH, Evidence, ExecutionCertificate, ExecutionMonitor};
pub use pattern::{DEFAULT_PATTERNS, PatternSet};
pub use tracker::{TrackerStats, VerdictRecord, VerdictTracker};
