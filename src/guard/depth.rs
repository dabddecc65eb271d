use super::walk::{max_over_operations, Measure};
use super::{Guard, GuardKind, Verdict};
use crate::config::DepthConfig;
use crate::error::{ArmorError, Violation};
use crate::query::{Field, QueryDocument};
use tracing::debug;

/// Rejects queries nested deeper than `max_depth`.
///
/// The operation root is depth 0 and every field adds one level. Fragments,
/// inline or spread, are transparent.
#[derive(Debug, Clone)]
pub struct DepthGuard {
    config: DepthConfig,
}

impl DepthGuard {
    pub fn new(config: DepthConfig) -> Result<Self, ArmorError> {
        Ok(Self { config })
    }

    /// Deepest selection over all measured operations.
    pub fn depth(&self, document: &QueryDocument) -> u64 {
        max_over_operations(&DepthMeasure, document, |operation| {
            self.config.ignore_introspection && operation.is_introspection_only(document)
        })
        .unwrap_or_default()
    }
}

struct DepthMeasure;

impl Measure for DepthMeasure {
    type Value = u64;

    fn field(&self, _field: &Field, _document: &QueryDocument, children: u64) -> u64 {
        children.saturating_add(1)
    }

    fn combine(&self, total: u64, next: u64) -> u64 {
        total.max(next)
    }
}

impl Guard for DepthGuard {
    fn kind(&self) -> GuardKind {
        GuardKind::Depth
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(&self, document: &QueryDocument) -> Verdict {
        let depth = self.depth(document);
        if depth > u64::from(self.config.max_depth) {
            debug!(depth, max = self.config.max_depth, "Query depth exceeded");
            return Verdict::Reject(Violation::max_depth_exceeded(depth, self.config.max_depth));
        }
        Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationCode;
    use crate::query::{FragmentDefinition, FragmentSpread, InlineFragment, Operation};
    use proptest::prelude::*;

    fn guard(max_depth: u32) -> DepthGuard {
        DepthGuard::new(DepthConfig {
            enabled: true,
            max_depth,
            ignore_introspection: true,
        })
        .unwrap()
    }

    /// `{ f { f { ... } } }` with `depth` levels of fields.
    fn chain(depth: usize) -> QueryDocument {
        let mut operation = Operation::query();
        if depth > 0 {
            let mut field = Field::new("f");
            for _ in 1..depth {
                field = Field::new("f").select(field);
            }
            operation = operation.select(field);
        }
        QueryDocument::new(0).operation(operation)
    }

    #[test]
    fn test_depth_counts_field_levels() {
        let document = QueryDocument::new(0).operation(
            Operation::query()
                .select(Field::new("a").select(Field::new("b").select(Field::new("c"))))
                .select(Field::new("d")),
        );
        assert_eq!(guard(10).depth(&document), 3);
    }

    #[test]
    fn test_four_levels_against_three() {
        let verdict = guard(3).evaluate(&chain(4));
        let violation = verdict.violation().unwrap();
        assert_eq!(violation.code, ViolationCode::MaxDepthExceeded);
        assert_eq!(violation.observed, 4);
        assert_eq!(violation.limit, 3);
    }

    #[test]
    fn test_fragments_do_not_add_depth() {
        let document = QueryDocument::new(0)
            .fragment(
                FragmentDefinition::new("UserFields", "User")
                    .select(Field::new("friends").select(Field::new("name"))),
            )
            .operation(Operation::query().select(
                Field::new("me")
                    .select(InlineFragment::on("User").select(FragmentSpread::new("UserFields"))),
            ));
        assert_eq!(guard(10).depth(&document), 3);
    }

    #[test]
    fn test_deepest_operation_wins() {
        let document = chain(2).operation(
            Operation::query().select(Field::new("a").select(Field::new("b").select(Field::new("c")))),
        );
        assert_eq!(guard(10).depth(&document), 3);
    }

    #[test]
    fn test_introspection_exemption_follows_flag() {
        let mut schema = Field::new("types");
        for _ in 0..10 {
            schema = Field::new("ofType").select(schema);
        }
        let document = QueryDocument::new(0)
            .operation(Operation::query().select(Field::new("__schema").select(schema)));

        assert!(guard(3).evaluate(&document).is_pass());

        let strict = DepthGuard::new(DepthConfig {
            enabled: true,
            max_depth: 3,
            ignore_introspection: false,
        })
        .unwrap();
        assert!(!strict.evaluate(&document).is_pass());
    }

    #[test]
    fn test_zero_max_depth_rejects_any_field() {
        assert!(guard(0).evaluate(&chain(0)).is_pass());
        assert!(!guard(0).evaluate(&chain(1)).is_pass());
    }

    proptest! {
        #[test]
        fn test_depth_boundary(max_depth in 0u32..40) {
            let guard = guard(max_depth);
            for depth in 0..=max_depth as usize {
                prop_assert!(guard.evaluate(&chain(depth)).is_pass());
            }
            prop_assert!(!guard.evaluate(&chain(max_depth as usize + 1)).is_pass());
        }
    }
}
