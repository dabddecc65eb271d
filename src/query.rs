//! Read-only query structure handed over by the host.
//!
//! The host parses and validates the GraphQL text; guards only ever see this
//! tree. It deserializes from JSON so hosts in other processes (and the CLI)
//! can hand documents over without linking a parser.

use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::{BTreeMap, HashSet};

/// Meta-fields that make up an introspection query.
pub const INTROSPECTION_FIELDS: &[&str] = &["__schema", "__type", "__typename"];

/// Whether a field name is one of the introspection meta-fields.
pub fn is_introspection_field(name: &str) -> bool {
    INTROSPECTION_FIELDS.contains(&name)
}

/// One incoming request: its operations, fragments and variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    /// Length of the raw query text, in characters
    pub source_length: usize,
    /// Operation definitions
    #[serde(default)]
    pub operations: Vec<Operation>,
    /// Named fragment definitions
    #[serde(default)]
    pub fragments: Vec<FragmentDefinition>,
    /// Request variables, used to resolve list size arguments
    #[serde(default)]
    pub variables: Map<String, serde_json::Value>,
}

impl QueryDocument {
    /// Create an empty document for query text of the given length.
    pub fn new(source_length: usize) -> Self {
        Self {
            source_length,
            ..Self::default()
        }
    }

    /// Create a document, measuring the raw text length in characters.
    pub fn from_source(source: &str) -> Self {
        Self::new(source.chars().count())
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn fragment(mut self, fragment: FragmentDefinition) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Look up a fragment definition by name.
    pub fn find_fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments.iter().find(|fragment| fragment.name == name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// `query`
    #[default]
    Query,
    /// `mutation`
    Mutation,
    /// `subscription`
    Subscription,
}

/// An operation definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation type
    #[serde(default)]
    pub kind: OperationKind,
    /// Operation name (anonymous when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Directive names applied to the operation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<String>,
    /// Top-level selections
    #[serde(default)]
    pub selection_set: Vec<Selection>,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn query() -> Self {
        Self::new(OperationKind::Query)
    }

    pub fn mutation() -> Self {
        Self::new(OperationKind::Mutation)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }

    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selection_set.push(selection.into());
        self
    }

    /// Whether every top-level field is an introspection meta-field.
    ///
    /// Top-level fragments are looked through. An operation without any
    /// top-level field is not considered introspection.
    pub fn is_introspection_only(&self, document: &QueryDocument) -> bool {
        let mut pending: Vec<&Selection> = self.selection_set.iter().collect();
        let mut expanded: HashSet<&str> = HashSet::new();
        let mut saw_field = false;

        while let Some(selection) = pending.pop() {
            match selection {
                Selection::Field(field) => {
                    if !is_introspection_field(&field.name) {
                        return false;
                    }
                    saw_field = true;
                }
                Selection::InlineFragment(inline) => pending.extend(inline.selection_set.iter()),
                Selection::FragmentSpread(spread) => {
                    if expanded.insert(spread.name.as_str()) {
                        if let Some(fragment) = document.find_fragment(&spread.name) {
                            pending.extend(fragment.selection_set.iter());
                        }
                    }
                }
            }
        }

        saw_field
    }
}

/// A node in a selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
    FragmentSpread(FragmentSpread),
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

impl From<InlineFragment> for Selection {
    fn from(fragment: InlineFragment) -> Self {
        Selection::InlineFragment(fragment)
    }
}

impl From<FragmentSpread> for Selection {
    fn from(spread: FragmentSpread) -> Self {
        Selection::FragmentSpread(spread)
    }
}

/// A selected field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Schema field name
    pub name: String,
    /// Response key, when different from the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Arguments as written in the query
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
    /// Directive names applied to the field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<String>,
    /// Sub-selections, empty for scalar and enum fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection_set: Vec<Selection>,
    /// Set by the host when the schema declares a list return type
    #[serde(default)]
    pub list: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            value,
        });
        self
    }

    pub fn directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }

    /// Mark the field as returning a list.
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selection_set.push(selection.into());
        self
    }

    /// True when the field carries an alias different from its name.
    pub fn is_aliased(&self) -> bool {
        self.alias
            .as_deref()
            .is_some_and(|alias| alias != self.name)
    }

    pub fn is_leaf(&self) -> bool {
        self.selection_set.is_empty()
    }

    pub fn find_argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|argument| argument.name == name)
    }
}

/// `... on Type { }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineFragment {
    /// `on Type`, absent for untyped fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<String>,
    #[serde(default)]
    pub selection_set: Vec<Selection>,
}

impl InlineFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(type_condition: impl Into<String>) -> Self {
        Self {
            type_condition: Some(type_condition.into()),
            ..Self::default()
        }
    }

    pub fn directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }

    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selection_set.push(selection.into());
        self
    }
}

/// `...FragmentName`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpread {
    /// Name of the spread fragment definition
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<String>,
}

impl FragmentSpread {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: Vec::new(),
        }
    }

    pub fn directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }
}

/// `fragment Name on Type { }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentDefinition {
    /// Name used by spreads
    pub name: String,
    /// Type the fragment applies to
    pub type_condition: String,
    /// Directive names on the definition, applied wherever it is spread
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<String>,
    #[serde(default)]
    pub selection_set: Vec<Selection>,
}

impl FragmentDefinition {
    pub fn new(name: impl Into<String>, type_condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_condition: type_condition.into(),
            ..Self::default()
        }
    }

    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selection_set.push(selection.into());
        self
    }
}

/// A field argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

/// An argument value as written in the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// `$name`, resolved against the request variables
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Interpret the value as a non-negative list size.
    ///
    /// Variables are resolved against the request variables. Anything that is
    /// not a non-negative integer yields `None`.
    pub fn as_size(&self, variables: &Map<String, serde_json::Value>) -> Option<u64> {
        match self {
            Value::Int(n) => u64::try_from(*n).ok(),
            Value::Variable(name) => variables.get(name).and_then(serde_json::Value::as_u64),
            _ => None,
        }
    }
}
