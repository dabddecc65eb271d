use super::walk::{max_over_operations, Measure};
use super::{Guard, GuardKind, Verdict};
use crate::config::CostConfig;
use crate::error::{ArmorError, Violation};
use crate::query::{Field, QueryDocument};
use tracing::debug;

/// Rejects queries whose estimated cost exceeds `max_cost`.
///
/// A leaf costs `scalar_cost`; a field with a selection set costs
/// `object_cost` plus its children. List fields multiply their whole subtree
/// by the requested size (a `list_size_arguments` argument) or, when no size
/// is given, by `list_multiplier`. Sibling costs add up and nested lists
/// multiply, so all arithmetic saturates at `u64::MAX`.
#[derive(Debug, Clone)]
pub struct CostGuard {
    config: CostConfig,
}

impl CostGuard {
    pub fn new(config: CostConfig) -> Result<Self, ArmorError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Cost of the most expensive measured operation.
    pub fn cost(&self, document: &QueryDocument) -> u64 {
        max_over_operations(self, document, |operation| {
            self.config.ignore_introspection && operation.is_introspection_only(document)
        })
        .unwrap_or_default()
    }

    /// Expected number of items a field returns, 1 for non-list fields.
    fn cardinality(&self, field: &Field, document: &QueryDocument) -> u64 {
        let mut sized = false;
        for name in &self.config.list_size_arguments {
            if let Some(argument) = field.find_argument(name) {
                if let Some(size) = argument.value.as_size(&document.variables) {
                    return size.max(1);
                }
                sized = true;
            }
        }

        if field.list || sized {
            self.config.list_multiplier
        } else {
            1
        }
    }
}

impl Measure for CostGuard {
    type Value = u64;

    fn field(&self, field: &Field, document: &QueryDocument, children: u64) -> u64 {
        let base = if field.is_leaf() {
            self.config.scalar_cost
        } else {
            self.config.object_cost.saturating_add(children)
        };
        base.saturating_mul(self.cardinality(field, document))
    }

    fn combine(&self, total: u64, next: u64) -> u64 {
        total.saturating_add(next)
    }
}

impl Guard for CostGuard {
    fn kind(&self) -> GuardKind {
        GuardKind::Cost
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(&self, document: &QueryDocument) -> Verdict {
        let cost = self.cost(document);
        if cost > self.config.max_cost {
            debug!(cost, max = self.config.max_cost, "Query cost exceeded");
            return Verdict::Reject(Violation::max_cost_exceeded(cost, self.config.max_cost));
        }
        Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationCode;
    use crate::query::{FragmentDefinition, FragmentSpread, Operation, Value};
    use proptest::prelude::*;
    use serde_json::json;

    fn config() -> CostConfig {
        CostConfig {
            max_cost: 1_000,
            ..CostConfig::default()
        }
    }

    fn guard(config: CostConfig) -> CostGuard {
        CostGuard::new(config).unwrap()
    }

    fn document(operation: Operation) -> QueryDocument {
        QueryDocument::new(0).operation(operation)
    }

    #[test]
    fn test_scalars_and_objects() {
        // user: 2 + (id: 1 + name: 1) = 4, plus version: 1
        let doc = document(
            Operation::query()
                .select(Field::new("user").select(Field::new("id")).select(Field::new("name")))
                .select(Field::new("version")),
        );
        assert_eq!(guard(config()).cost(&doc), 5);
    }

    #[test]
    fn test_list_hint_uses_multiplier() {
        // users: (2 + 1) * 10
        let doc = document(
            Operation::query().select(Field::new("users").list().select(Field::new("id"))),
        );
        assert_eq!(guard(config()).cost(&doc), 30);
    }

    #[test]
    fn test_size_argument_overrides_multiplier() {
        let doc = document(
            Operation::query().select(
                Field::new("users")
                    .list()
                    .argument("first", Value::Int(3))
                    .select(Field::new("id")),
            ),
        );
        assert_eq!(guard(config()).cost(&doc), 9);
    }

    #[test]
    fn test_size_argument_from_variables() {
        let doc = document(
            Operation::query().select(
                Field::new("users")
                    .argument("limit", Value::Variable("n".to_string()))
                    .select(Field::new("id")),
            ),
        )
        .variable("n", json!(50));
        assert_eq!(guard(config()).cost(&doc), 150);
    }

    #[test]
    fn test_unresolved_size_argument_falls_back_to_multiplier() {
        let doc = document(
            Operation::query().select(
                Field::new("users")
                    .argument("first", Value::Variable("missing".to_string()))
                    .select(Field::new("id")),
            ),
        );
        assert_eq!(guard(config()).cost(&doc), 30);
    }

    #[test]
    fn test_nested_lists_multiply() {
        // users: (2 + posts) * 10, posts: (2 + 1) * 10 = 30 -> 320
        let doc = document(
            Operation::query().select(
                Field::new("users")
                    .list()
                    .select(Field::new("posts").list().select(Field::new("title"))),
            ),
        );
        assert_eq!(guard(config()).cost(&doc), 320);
    }

    #[test]
    fn test_fragments_are_costed() {
        let doc = QueryDocument::new(0)
            .fragment(
                FragmentDefinition::new("UserFields", "User")
                    .select(Field::new("id"))
                    .select(Field::new("name")),
            )
            .operation(Operation::query().select(
                Field::new("user")
                    .select(FragmentSpread::new("UserFields"))
                    .select(FragmentSpread::new("UserFields")),
            ));
        assert_eq!(guard(config()).cost(&doc), 6);
    }

    #[test]
    fn test_reject_reports_cost_and_limit() {
        let doc = document(
            Operation::query().select(
                Field::new("users")
                    .argument("first", Value::Int(1_000))
                    .select(Field::new("id")),
            ),
        );
        let verdict = guard(config()).evaluate(&doc);
        let violation = verdict.violation().unwrap();
        assert_eq!(violation.code, ViolationCode::MaxCostExceeded);
        assert_eq!(violation.observed, 3_000);
        assert_eq!(violation.limit, 1_000);
    }

    #[test]
    fn test_cost_saturates() {
        let mut field = Field::new("id");
        for _ in 0..64 {
            field = Field::new("items").argument("first", Value::Int(i64::MAX)).select(field);
        }
        let doc = document(Operation::query().select(field));

        let guard = guard(config());
        assert_eq!(guard.cost(&doc), u64::MAX);
        assert!(!guard.evaluate(&doc).is_pass());
    }

    #[test]
    fn test_introspection_ignored_by_default() {
        let doc = document(Operation::query().select(
            Field::new("__schema").select(Field::new("types").list().select(Field::new("name"))),
        ));
        let mut strict = config();
        strict.max_cost = 0;
        assert!(guard(strict.clone()).evaluate(&doc).is_pass());

        strict.ignore_introspection = false;
        assert!(!guard(strict).evaluate(&doc).is_pass());
    }

    #[test]
    fn test_zero_max_cost_rejects_any_costed_field() {
        let mut zero = config();
        zero.max_cost = 0;
        assert!(guard(zero.clone()).evaluate(&document(Operation::query())).is_pass());
        assert!(!guard(zero)
            .evaluate(&document(Operation::query().select(Field::new("id"))))
            .is_pass());
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let mut bad = config();
        bad.list_multiplier = 0;
        assert!(matches!(CostGuard::new(bad), Err(ArmorError::Config(_))));
    }

    fn arb_field() -> impl Strategy<Value = Field> {
        let leaf = "[a-z]{1,4}".prop_map(|name| Field::new(name));
        leaf.prop_recursive(5, 48, 4, |inner| {
            ("[a-z]{1,4}", any::<bool>(), prop::collection::vec(inner, 1..4)).prop_map(
                |(name, list, children)| {
                    let mut field = Field::new(name);
                    field.list = list;
                    for child in children {
                        field = field.select(child);
                    }
                    field
                },
            )
        })
    }

    proptest! {
        #[test]
        fn test_doubling_multiplier_never_decreases_cost(
            fields in prop::collection::vec(arb_field(), 1..4),
            multiplier in 1u64..1_000,
        ) {
            let mut operation = Operation::query();
            for field in fields {
                operation = operation.select(field);
            }
            let doc = document(operation);

            let mut base = config();
            base.list_multiplier = multiplier;
            let mut doubled = base.clone();
            doubled.list_multiplier = multiplier * 2;

            let before = guard(base.clone()).cost(&doc);
            prop_assert_eq!(before, guard(base).cost(&doc));
            prop_assert!(guard(doubled).cost(&doc) >= before);
        }
    }
}
