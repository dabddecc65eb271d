use super::walk::{max_over_operations, Measure};
use super::{Guard, GuardKind, Verdict};
use crate::config::DirectiveConfig;
use crate::error::{ArmorError, Violation};
use crate::query::{
    Field, FragmentDefinition, FragmentSpread, InlineFragment, Operation, QueryDocument,
};
use std::collections::HashSet;
use tracing::debug;

/// Limits directive applications across the query.
///
/// With `allow_duplicate_directives` every application counts; without it
/// only distinct directive names per node are counted.
#[derive(Debug, Clone)]
pub struct DirectiveGuard {
    config: DirectiveConfig,
}

impl DirectiveGuard {
    pub fn new(config: DirectiveConfig) -> Result<Self, ArmorError> {
        Ok(Self { config })
    }

    pub fn count(&self, document: &QueryDocument) -> u64 {
        max_over_operations(self, document, |operation| {
            self.config.ignore_introspection && operation.is_introspection_only(document)
        })
        .unwrap_or_default()
    }

    fn applied(&self, directives: &[String]) -> u64 {
        let count = if self.config.allow_duplicate_directives {
            directives.len()
        } else {
            directives.iter().collect::<HashSet<_>>().len()
        };
        count as u64
    }
}

impl Measure for DirectiveGuard {
    type Value = u64;

    fn field(&self, field: &Field, _document: &QueryDocument, children: u64) -> u64 {
        children.saturating_add(self.applied(&field.directives))
    }

    fn combine(&self, total: u64, next: u64) -> u64 {
        total.saturating_add(next)
    }

    fn inline_fragment(&self, fragment: &InlineFragment, children: u64) -> u64 {
        children.saturating_add(self.applied(&fragment.directives))
    }

    fn fragment_definition(&self, definition: &FragmentDefinition, children: u64) -> u64 {
        children.saturating_add(self.applied(&definition.directives))
    }

    fn fragment_spread(&self, spread: &FragmentSpread, fragment: u64) -> u64 {
        fragment.saturating_add(self.applied(&spread.directives))
    }

    fn operation(&self, operation: &Operation, children: u64) -> u64 {
        children.saturating_add(self.applied(&operation.directives))
    }
}

impl Guard for DirectiveGuard {
    fn kind(&self) -> GuardKind {
        GuardKind::Directives
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(&self, document: &QueryDocument) -> Verdict {
        let directives = self.count(document);
        if directives > u64::from(self.config.max_directives) {
            debug!(
                directives,
                max = self.config.max_directives,
                "Too many directives"
            );
            return Verdict::Reject(Violation::max_directives_exceeded(
                directives,
                self.config.max_directives,
            ));
        }
        Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationCode;

    fn guard(max_directives: u32, allow_duplicate_directives: bool) -> DirectiveGuard {
        DirectiveGuard::new(DirectiveConfig {
            enabled: true,
            max_directives,
            allow_duplicate_directives,
            ignore_introspection: false,
        })
        .unwrap()
    }

    fn repeated(times: usize) -> QueryDocument {
        let mut field = Field::new("user");
        for _ in 0..times {
            field = field.directive("include");
        }
        QueryDocument::new(0).operation(Operation::query().select(field))
    }

    #[test]
    fn test_duplicates_counted_when_allowed() {
        assert_eq!(guard(10, true).count(&repeated(5)), 5);
    }

    #[test]
    fn test_duplicates_collapsed_when_disallowed() {
        assert_eq!(guard(10, false).count(&repeated(5)), 1);
        assert!(guard(1, false).evaluate(&repeated(50)).is_pass());
    }

    #[test]
    fn test_counts_every_node_kind() {
        let document = QueryDocument::new(0)
            .fragment(
                FragmentDefinition::new("F", "User").select(Field::new("name").directive("skip")),
            )
            .operation(
                Operation::query()
                    .directive("cached")
                    .select(
                        Field::new("me")
                            .directive("include")
                            .select(InlineFragment::on("User").directive("defer"))
                            .select(FragmentSpread::new("F").directive("include")),
                    ),
            );
        assert_eq!(guard(10, true).count(&document), 5);
    }

    #[test]
    fn test_fragment_definition_directives_counted() {
        let mut definition = FragmentDefinition::new("F", "Query").select(Field::new("a"));
        for _ in 0..100 {
            definition.directives.push("dir".to_string());
        }
        definition.directives.push("other".to_string());
        let document = QueryDocument::new(0)
            .fragment(definition)
            .operation(
                Operation::query()
                    .select(FragmentSpread::new("F"))
                    .select(FragmentSpread::new("F")),
            );

        // Counted once per spread, like the fields inside the fragment.
        assert_eq!(guard(50, true).count(&document), 202);
        assert!(!guard(50, true).evaluate(&document).is_pass());

        assert_eq!(guard(50, false).count(&document), 4);
        assert!(guard(50, false).evaluate(&document).is_pass());
        assert!(!guard(3, false).evaluate(&document).is_pass());
    }

    #[test]
    fn test_over_limit_rejects() {
        let verdict = guard(4, true).evaluate(&repeated(5));
        let violation = verdict.violation().unwrap();
        assert_eq!(violation.code, ViolationCode::MaxDirectivesExceeded);
        assert_eq!(violation.observed, 5);
        assert_eq!(violation.limit, 4);
        assert!(guard(5, true).evaluate(&repeated(5)).is_pass());
    }

    #[test]
    fn test_zero_max_directives_rejects_any_directive() {
        assert!(guard(0, true).evaluate(&repeated(0)).is_pass());
        assert!(!guard(0, false).evaluate(&repeated(1)).is_pass());
    }
}
