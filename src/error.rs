//! Error types and GraphQL-compliant error responses.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Protection violation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// Raw query text is longer than allowed
    CharacterLimitExceeded,
    /// Query cost exceeds limit
    MaxCostExceeded,
    /// Too many aliases in query
    MaxAliasesExceeded,
    /// Too many directive applications in query
    MaxDirectivesExceeded,
    /// Query depth exceeds limit
    MaxDepthExceeded,
    /// More than one operation in a single transport request
    BatchedRequestsDisabled,
}

impl ViolationCode {
    /// Get the code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CharacterLimitExceeded => "CHARACTER_LIMIT_EXCEEDED",
            Self::MaxCostExceeded => "MAX_COST_EXCEEDED",
            Self::MaxAliasesExceeded => "MAX_ALIASES_EXCEEDED",
            Self::MaxDirectivesExceeded => "MAX_DIRECTIVES_EXCEEDED",
            Self::MaxDepthExceeded => "MAX_DEPTH_EXCEEDED",
            Self::BatchedRequestsDisabled => "BATCHED_REQUESTS_DISABLED",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A protection violation detected in a query document.
///
/// Carries the measured value and the configured ceiling so clients can see
/// how far over the limit they were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation code
    pub code: ViolationCode,
    /// Human-readable message
    pub message: String,
    /// Value measured on the query
    pub observed: u64,
    /// Configured limit
    pub limit: u64,
}

impl Violation {
    /// Create a new violation.
    pub fn new(code: ViolationCode, message: impl Into<String>, observed: u64, limit: u64) -> Self {
        Self {
            code,
            message: message.into(),
            observed,
            limit,
        }
    }

    /// Create a character limit violation.
    pub fn character_limit_exceeded(actual: usize, max: usize) -> Self {
        Self::new(
            ViolationCode::CharacterLimitExceeded,
            format!(
                "Query is {} characters long, maximum allowed is {}",
                actual, max
            ),
            actual as u64,
            max as u64,
        )
    }

    /// Create a cost exceeded violation.
    pub fn max_cost_exceeded(actual: u64, max: u64) -> Self {
        Self::new(
            ViolationCode::MaxCostExceeded,
            format!(
                "Query cost of {} exceeds maximum allowed cost of {}",
                actual, max
            ),
            actual,
            max,
        )
    }

    /// Create a too many aliases violation.
    pub fn max_aliases_exceeded(actual: u64, max: u32) -> Self {
        Self::new(
            ViolationCode::MaxAliasesExceeded,
            format!(
                "Query contains {} aliases, maximum allowed is {}",
                actual, max
            ),
            actual,
            u64::from(max),
        )
    }

    /// Create a too many directives violation.
    pub fn max_directives_exceeded(actual: u64, max: u32) -> Self {
        Self::new(
            ViolationCode::MaxDirectivesExceeded,
            format!(
                "Query contains {} directives, maximum allowed is {}",
                actual, max
            ),
            actual,
            u64::from(max),
        )
    }

    /// Create a depth exceeded violation.
    pub fn max_depth_exceeded(actual: u64, max: u32) -> Self {
        Self::new(
            ViolationCode::MaxDepthExceeded,
            format!(
                "Query depth of {} exceeds maximum allowed depth of {}",
                actual, max
            ),
            actual,
            u64::from(max),
        )
    }

    /// Create a batched request violation.
    pub fn batched_requests_disabled(operations: usize) -> Self {
        Self::new(
            ViolationCode::BatchedRequestsDisabled,
            format!(
                "Batched requests are disabled, request carries {} operations",
                operations
            ),
            operations as u64,
            1,
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A source location in the GraphQL document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// An outgoing GraphQL error, as seen by response hooks.
///
/// Errors come from anywhere in the host (validation, resolvers, our own
/// violations); hooks may rewrite them but never drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Client-visible message
    pub message: String,
    /// Source locations (if applicable)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    /// Response path of the failing field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    /// Additional metadata (`code`, limits, debug details)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl ResponseError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Add an extension entry.
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

impl From<&Violation> for ResponseError {
    fn from(violation: &Violation) -> Self {
        ResponseError::new(violation.message.clone())
            .with_extension("code", json!(violation.code.as_str()))
            .with_extension("observed", json!(violation.observed))
            .with_extension("limit", json!(violation.limit))
            .with_extension("zentinel", json!(true))
    }
}

/// Errors raised while resolving configuration or building guards.
#[derive(Debug, thiserror::Error)]
pub enum ArmorError {
    /// Malformed or out-of-range setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Policy YAML could not be parsed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Policy overrides could not be parsed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build a GraphQL-compliant error response.
///
/// Returns a JSON value in the standard GraphQL error format.
/// Note: GraphQL errors are returned with HTTP 200 status.
pub fn graphql_error_response(violations: &[Violation]) -> Value {
    json!({
        "errors": violations
            .iter()
            .map(ResponseError::from)
            .collect::<Vec<_>>()
    })
}
