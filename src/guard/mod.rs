//! Guards: independent protection checks run by the host.
//!
//! A guard is either structural (evaluated against the query document before
//! execution) or response-shaping (rewrites outgoing errors), or both. Guards
//! are built once from configuration and hold no mutable state, so a single
//! instance serves every request.

mod aliases;
mod character_limit;
mod cost;
mod depth;
mod directives;
mod field_suggestion;
pub(crate) mod walk;

pub use aliases::AliasGuard;
pub use character_limit::CharacterLimitGuard;
pub use cost::CostGuard;
pub use depth::DepthGuard;
pub use directives::DirectiveGuard;
pub use field_suggestion::FieldSuggestionGuard;

use crate::error::{ResponseError, Violation};
use crate::query::QueryDocument;
use std::fmt;

/// The kinds of guard built into the armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardKind {
    /// "Did you mean" masking on outgoing errors
    FieldSuggestion,
    /// Raw query text length
    CharacterLimit,
    /// Estimated query cost
    Cost,
    /// Alias count
    Aliases,
    /// Directive application count
    Directives,
    /// Selection depth
    Depth,
    /// A guard supplied by the host
    Custom(&'static str),
}

impl GuardKind {
    /// Get the kind as its configuration key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldSuggestion => "field_suggestion",
            Self::CharacterLimit => "character_limit",
            Self::Cost => "cost",
            Self::Aliases => "aliases",
            Self::Directives => "directives",
            Self::Depth => "depth",
            Self::Custom(name) => *name,
        }
    }
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a structural guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The query may proceed
    Pass,
    /// The query must be aborted before execution
    Reject(Violation),
}

impl Verdict {
    /// Whether the guard let the query through.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// The rejection, if any.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Verdict::Pass => None,
            Verdict::Reject(violation) => Some(violation),
        }
    }

    /// Consume the verdict, keeping the rejection.
    pub fn into_violation(self) -> Option<Violation> {
        match self {
            Verdict::Pass => None,
            Verdict::Reject(violation) => Some(violation),
        }
    }
}

/// Common contract for every guard.
pub trait Guard: Send + Sync + fmt::Debug {
    fn kind(&self) -> GuardKind;

    /// Whether the guard contributes anything to the bundle.
    fn is_enabled(&self) -> bool;

    /// Check a query document before execution.
    fn evaluate(&self, _document: &QueryDocument) -> Verdict {
        Verdict::Pass
    }

    /// Rewrite an outgoing error in place.
    fn mask_error(&self, _error: &mut ResponseError) {}

    /// Contributes a structural validator.
    fn validates(&self) -> bool {
        true
    }

    /// Contributes a response hook.
    fn rewrites_errors(&self) -> bool {
        false
    }

    /// A rejection from this guard skips every later validator.
    fn short_circuits(&self) -> bool {
        false
    }
}
