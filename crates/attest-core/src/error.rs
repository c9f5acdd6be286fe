/// Errors raised while constructing a checker. Scanning itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("fabrication pattern set is empty")]
    EmptyPatternSet,

    #[error("invalid fabrication pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_set_display() {
        let err = VerifyError::EmptyPatternSet;
        assert_eq!(err.to_string(), "fabrication pattern set is empty");
    }

    #[test]
    fn invalid_pattern_display_names_pattern() {
        let source = regex::Regex::new("[unclosed").unwrap_err();
        let err = VerifyError::InvalidPattern {
            pattern: "[unclosed".to_owned(),
            source,
        };
        assert!(err.to_string().contains("[unclosed"));
    }
}
