use super::{Guard, GuardKind, Verdict};
use crate::config::CharacterLimitConfig;
use crate::error::{ArmorError, Violation};
use crate::query::QueryDocument;
use tracing::debug;

/// Rejects query text longer than `max_characters`.
///
/// Only looks at the raw text length, so it is the cheapest check and runs
/// before any tree walk.
#[derive(Debug, Clone)]
pub struct CharacterLimitGuard {
    config: CharacterLimitConfig,
}

impl CharacterLimitGuard {
    pub fn new(config: CharacterLimitConfig) -> Result<Self, ArmorError> {
        Ok(Self { config })
    }
}

impl Guard for CharacterLimitGuard {
    fn kind(&self) -> GuardKind {
        GuardKind::CharacterLimit
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(&self, document: &QueryDocument) -> Verdict {
        if document.source_length > self.config.max_characters {
            debug!(
                length = document.source_length,
                max = self.config.max_characters,
                "Query exceeds character limit"
            );
            return Verdict::Reject(Violation::character_limit_exceeded(
                document.source_length,
                self.config.max_characters,
            ));
        }
        Verdict::Pass
    }

    fn short_circuits(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationCode;

    fn guard(max_characters: usize) -> CharacterLimitGuard {
        CharacterLimitGuard::new(CharacterLimitConfig {
            enabled: true,
            max_characters,
        })
        .unwrap()
    }

    #[test]
    fn test_at_limit_passes() {
        assert!(guard(10).evaluate(&QueryDocument::new(10)).is_pass());
    }

    #[test]
    fn test_over_limit_rejects() {
        let verdict = guard(10).evaluate(&QueryDocument::new(11));
        let violation = verdict.violation().unwrap();
        assert_eq!(violation.code, ViolationCode::CharacterLimitExceeded);
        assert_eq!(violation.observed, 11);
        assert_eq!(violation.limit, 10);
    }

    #[test]
    fn test_zero_limit_rejects_any_text() {
        assert!(guard(0).evaluate(&QueryDocument::new(0)).is_pass());
        assert!(!guard(0).evaluate(&QueryDocument::from_source("{a}")).is_pass());
    }

    #[test]
    fn test_short_circuits() {
        assert!(guard(10).short_circuits());
        assert!(guard(10).validates());
        assert!(!guard(10).rewrites_errors());
    }
}
