//! GraphQL Armor for Zentinel
//!
//! Request-time protection policies for GraphQL servers. The host parses the
//! query and hands its structure to a [`ProtectionBundle`]; the bundle rejects
//! queries that are too large, too deep, too expensive or too repetitive, and
//! scrubs schema hints from outgoing errors.
//!
//! # Features
//!
//! - Character limit (cap raw query size before any tree walk)
//! - Cost analysis (scalar/object costs, list multipliers, size arguments)
//! - Alias limiting (prevent alias-based amplification)
//! - Directive limiting (prevent directive repetition)
//! - Depth limiting (prevent deeply nested queries)
//! - Field suggestion masking (hide "Did you mean" hints)
//! - Batched requests and debug errors are always disabled
//!
//! # Example
//!
//! ```ignore
//! use zentinel_graphql_armor::{build_bundle, graphql_error_response, PolicyConfig};
//!
//! let bundle = build_bundle(PolicyConfig::from_yaml_str(&policy)?)?;
//! let violations = bundle.validate(&document);
//! if !violations.is_empty() {
//!     return Ok(graphql_error_response(&violations));
//! }
//! ```

pub mod armor;
pub mod config;
pub mod error;
pub mod guard;
pub mod query;

pub use armor::{build_bundle, Armor, ProtectionBundle};
pub use config::PolicyConfig;
pub use error::{graphql_error_response, ArmorError, ResponseError, Violation, ViolationCode};
pub use guard::{Guard, GuardKind, Verdict};
pub use query::QueryDocument;
