//! Orchestrator: turns a policy into the bundle the host installs.
//!
//! `Armor` owns the guards built from configuration; `ProtectionBundle` is the
//! immutable result handed to the host, with structural validators run during
//! validation and response hooks run while formatting errors.

use crate::config::PolicyConfig;
use crate::error::{ArmorError, ResponseError, Violation};
use crate::guard::{
    AliasGuard, CharacterLimitGuard, CostGuard, DepthGuard, DirectiveGuard, FieldSuggestionGuard,
    Guard, Verdict,
};
use crate::query::QueryDocument;
use std::sync::Arc;
use tracing::{debug, info};

/// Error extensions that only exist in debug output.
const DEBUG_EXTENSIONS: &[&str] = &["stacktrace", "exception"];

/// Every guard built from a policy, enabled or not.
#[derive(Debug, Clone)]
pub struct Armor {
    guards: Vec<Arc<dyn Guard>>,
}

impl Armor {
    /// Build the guards from configuration.
    ///
    /// The character limit is built before any tree-walking guard so it runs
    /// first.
    pub fn new(config: PolicyConfig) -> Result<Self, ArmorError> {
        config.validate()?;

        let guards: Vec<Arc<dyn Guard>> = vec![
            Arc::new(FieldSuggestionGuard::new(config.field_suggestion)?),
            Arc::new(CharacterLimitGuard::new(config.character_limit)?),
            Arc::new(CostGuard::new(config.cost)?),
            Arc::new(AliasGuard::new(config.aliases)?),
            Arc::new(DirectiveGuard::new(config.directives)?),
            Arc::new(DepthGuard::new(config.depth)?),
        ];

        Ok(Self { guards })
    }

    /// Append a host-supplied guard after the built-in ones.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(&self) -> &[Arc<dyn Guard>] {
        &self.guards
    }

    /// Merge enabled guards into a bundle, keeping construction order.
    pub fn protect(&self) -> ProtectionBundle {
        let mut validators = Vec::new();
        let mut response_hooks = Vec::new();

        for guard in self.guards.iter().filter(|guard| guard.is_enabled()) {
            if guard.validates() {
                validators.push(Arc::clone(guard));
            }
            if guard.rewrites_errors() {
                response_hooks.push(Arc::clone(guard));
            }
        }

        info!(
            validators = validators.len(),
            response_hooks = response_hooks.len(),
            "Protection bundle built"
        );

        ProtectionBundle {
            validators,
            response_hooks,
        }
    }
}

/// Build the bundle for a policy in one call.
pub fn build_bundle(config: PolicyConfig) -> Result<ProtectionBundle, ArmorError> {
    Ok(Armor::new(config)?.protect())
}

/// Validators and response hooks for the host.
///
/// Immutable once built; clone the `Arc` and share it across requests.
#[derive(Debug, Clone)]
pub struct ProtectionBundle {
    validators: Vec<Arc<dyn Guard>>,
    response_hooks: Vec<Arc<dyn Guard>>,
}

impl ProtectionBundle {
    pub fn validators(&self) -> &[Arc<dyn Guard>] {
        &self.validators
    }

    pub fn response_hooks(&self) -> &[Arc<dyn Guard>] {
        &self.response_hooks
    }

    /// A transport request must carry exactly one operation.
    pub fn allow_batched_requests(&self) -> bool {
        false
    }

    /// Debug error details (stack traces, exception data) are never sent.
    pub fn debug_errors(&self) -> bool {
        false
    }

    /// Run every validator in order and collect the rejections.
    ///
    /// A rejection from a short-circuiting validator ends the run, so
    /// oversized input never reaches the tree-walking guards.
    pub fn validate(&self, document: &QueryDocument) -> Vec<Violation> {
        let mut violations = Vec::new();

        for validator in &self.validators {
            if let Verdict::Reject(violation) = validator.evaluate(document) {
                debug!(
                    guard = %validator.kind(),
                    code = %violation.code,
                    observed = violation.observed,
                    limit = violation.limit,
                    "Query rejected"
                );
                violations.push(violation);
                if validator.short_circuits() {
                    break;
                }
            }
        }

        violations
    }

    /// Rejects batched transport requests.
    pub fn check_batch(&self, operations: usize) -> Verdict {
        if operations > 1 && !self.allow_batched_requests() {
            return Verdict::Reject(Violation::batched_requests_disabled(operations));
        }
        Verdict::Pass
    }

    /// Run every response hook on every outgoing error.
    ///
    /// Errors are rewritten, never removed. Debug-only extensions are dropped
    /// as well since debug output is disabled.
    pub fn mask_errors(&self, errors: &mut [ResponseError]) {
        for error in errors.iter_mut() {
            for hook in &self.response_hooks {
                hook.mask_error(error);
            }
            if !self.debug_errors() {
                for key in DEBUG_EXTENSIONS {
                    error.extensions.remove(*key);
                }
            }
        }
    }
}
