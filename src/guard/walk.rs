//! Bottom-up fold over a selection tree.
//!
//! Every tree-walking guard reduces a selection set to a single value: the
//! deepest branch, the total cost, the number of aliases. `Walker` does the
//! traversal once for all of them with an explicit stack, so adversarially
//! deep queries cannot overflow the thread stack.
//!
//! Fragment values do not depend on where the fragment is spread, so each
//! fragment is folded once per document and reused. A spread that refers to a
//! fragment currently being folded (a cycle) or to an unknown fragment folds
//! to the identity value.

use crate::query::{
    Field, FragmentDefinition, FragmentSpread, InlineFragment, Operation, QueryDocument,
    Selection,
};
use std::collections::{HashMap, HashSet};
use std::slice;

/// How a guard turns a selection tree into a value.
pub(crate) trait Measure {
    type Value: Copy + Default;

    /// Value of a field, given the folded value of its selection set.
    fn field(&self, field: &Field, document: &QueryDocument, children: Self::Value) -> Self::Value;

    /// Combine two sibling values.
    fn combine(&self, total: Self::Value, next: Self::Value) -> Self::Value;

    fn inline_fragment(&self, _fragment: &InlineFragment, children: Self::Value) -> Self::Value {
        children
    }

    /// Value of a fragment definition, given its folded selection set.
    ///
    /// Folded once per document; the result is what every spread reuses.
    fn fragment_definition(
        &self,
        _definition: &FragmentDefinition,
        children: Self::Value,
    ) -> Self::Value {
        children
    }

    fn fragment_spread(&self, _spread: &FragmentSpread, fragment: Self::Value) -> Self::Value {
        fragment
    }

    fn operation(&self, _operation: &Operation, children: Self::Value) -> Self::Value {
        children
    }
}

enum Owner<'a> {
    Operation(&'a Operation),
    Field(&'a Field),
    InlineFragment(&'a InlineFragment),
    FragmentSpread(&'a FragmentSpread, &'a FragmentDefinition),
}

struct Frame<'a, V> {
    owner: Owner<'a>,
    pending: slice::Iter<'a, Selection>,
    total: V,
}

impl<'a, V: Default> Frame<'a, V> {
    fn new(owner: Owner<'a>, selection_set: &'a [Selection]) -> Self {
        Self {
            owner,
            pending: selection_set.iter(),
            total: V::default(),
        }
    }
}

pub(crate) struct Walker<'a, M: Measure> {
    measure: &'a M,
    document: &'a QueryDocument,
    fragments: HashMap<&'a str, M::Value>,
}

impl<'a, M: Measure> Walker<'a, M> {
    pub(crate) fn new(measure: &'a M, document: &'a QueryDocument) -> Self {
        Self {
            measure,
            document,
            fragments: HashMap::new(),
        }
    }

    /// Fold one operation of the document.
    pub(crate) fn operation(&mut self, operation: &'a Operation) -> M::Value {
        let mut stack = vec![Frame::new(
            Owner::Operation(operation),
            &operation.selection_set,
        )];
        let mut in_progress: HashSet<&'a str> = HashSet::new();

        while let Some(frame) = stack.last_mut() {
            let Some(selection) = frame.pending.next() else {
                let Some(done) = stack.pop() else { break };
                let value = match done.owner {
                    Owner::Operation(operation) => {
                        return self.measure.operation(operation, done.total);
                    }
                    Owner::Field(field) => self.measure.field(field, self.document, done.total),
                    Owner::InlineFragment(fragment) => {
                        self.measure.inline_fragment(fragment, done.total)
                    }
                    Owner::FragmentSpread(spread, definition) => {
                        let fragment = self.measure.fragment_definition(definition, done.total);
                        in_progress.remove(spread.name.as_str());
                        self.fragments.insert(spread.name.as_str(), fragment);
                        self.measure.fragment_spread(spread, fragment)
                    }
                };
                self.fold(&mut stack, value);
                continue;
            };

            match selection {
                Selection::Field(field) => {
                    stack.push(Frame::new(Owner::Field(field), &field.selection_set));
                }
                Selection::InlineFragment(fragment) => {
                    stack.push(Frame::new(
                        Owner::InlineFragment(fragment),
                        &fragment.selection_set,
                    ));
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.name.as_str();
                    if let Some(known) = self.fragments.get(name).copied() {
                        let value = self.measure.fragment_spread(spread, known);
                        self.fold(&mut stack, value);
                        continue;
                    }

                    match self.document.find_fragment(name) {
                        Some(definition) if in_progress.insert(name) => {
                            stack.push(Frame::new(
                                Owner::FragmentSpread(spread, definition),
                                &definition.selection_set,
                            ));
                        }
                        _ => {
                            let value = self.measure.fragment_spread(spread, M::Value::default());
                            self.fold(&mut stack, value);
                        }
                    }
                }
            }
        }

        M::Value::default()
    }

    fn fold(&self, stack: &mut [Frame<'a, M::Value>], value: M::Value) {
        if let Some(top) = stack.last_mut() {
            top.total = self.measure.combine(top.total, value);
        }
    }
}

/// Fold every operation and keep the largest value.
///
/// Operations for which `skip` returns true are left out. Returns `None` when
/// nothing was measured.
pub(crate) fn max_over_operations<M>(
    measure: &M,
    document: &QueryDocument,
    skip: impl Fn(&Operation) -> bool,
) -> Option<M::Value>
where
    M: Measure,
    M::Value: Ord,
{
    let mut walker = Walker::new(measure, document);
    document
        .operations
        .iter()
        .filter(|operation| !skip(operation))
        .map(|operation| walker.operation(operation))
        .max()
}
