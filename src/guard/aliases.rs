use super::walk::{max_over_operations, Measure};
use super::{Guard, GuardKind, Verdict};
use crate::config::AliasConfig;
use crate::error::{ArmorError, Violation};
use crate::query::{Field, QueryDocument};
use tracing::debug;

/// Limits alias-based amplification.
///
/// Every field carrying an alias different from its name counts once per
/// occurrence, including fields reached through fragments.
#[derive(Debug, Clone)]
pub struct AliasGuard {
    config: AliasConfig,
}

impl AliasGuard {
    pub fn new(config: AliasConfig) -> Result<Self, ArmorError> {
        Ok(Self { config })
    }

    pub fn count(&self, document: &QueryDocument) -> u64 {
        max_over_operations(&AliasCount, document, |operation| {
            self.config.ignore_introspection && operation.is_introspection_only(document)
        })
        .unwrap_or_default()
    }
}

struct AliasCount;

impl Measure for AliasCount {
    type Value = u64;

    fn field(&self, field: &Field, _document: &QueryDocument, children: u64) -> u64 {
        children.saturating_add(u64::from(field.is_aliased()))
    }

    fn combine(&self, total: u64, next: u64) -> u64 {
        total.saturating_add(next)
    }
}

impl Guard for AliasGuard {
    fn kind(&self) -> GuardKind {
        GuardKind::Aliases
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(&self, document: &QueryDocument) -> Verdict {
        let aliases = self.count(document);
        if aliases > u64::from(self.config.max_aliases) {
            debug!(aliases, max = self.config.max_aliases, "Too many aliases");
            return Verdict::Reject(Violation::max_aliases_exceeded(
                aliases,
                self.config.max_aliases,
            ));
        }
        Verdict::Pass
    }
}
