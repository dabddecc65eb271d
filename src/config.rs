//! Policy configuration.
//!
//! One record per guard kind. Every field has a built-in default, so a user
//! supplies only the overrides they care about:
//!
//! ```yaml
//! depth:
//!   max_depth: 8
//! cost:
//!   max_cost: 2000
//!   list_size_arguments: [first, last]
//! field_suggestion:
//!   enabled: false
//! ```

use crate::error::ArmorError;
use serde::{Deserialize, Serialize};

/// Resolved configuration for every guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub character_limit: CharacterLimitConfig,
    pub cost: CostConfig,
    pub depth: DepthConfig,
    pub aliases: AliasConfig,
    pub directives: DirectiveConfig,
    pub field_suggestion: FieldSuggestionConfig,
}

impl PolicyConfig {
    /// Merge user overrides (a JSON object keyed by guard kind) over the
    /// defaults and validate the result.
    pub fn resolve(overrides: serde_json::Value) -> Result<Self, ArmorError> {
        let config: PolicyConfig = serde_json::from_value(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML policy document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ArmorError> {
        let config: PolicyConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every record for malformed settings.
    pub fn validate(&self) -> Result<(), ArmorError> {
        self.cost.validate()?;
        self.field_suggestion.validate()?;
        Ok(())
    }

    /// Configuration with every guard turned off.
    pub fn disabled() -> Self {
        let mut config = Self::default();
        config.character_limit.enabled = false;
        config.cost.enabled = false;
        config.depth.enabled = false;
        config.aliases.enabled = false;
        config.directives.enabled = false;
        config.field_suggestion.enabled = false;
        config
    }
}

/// Raw query text length limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CharacterLimitConfig {
    pub enabled: bool,
    pub max_characters: usize,
}

impl Default for CharacterLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_characters: 15_000,
        }
    }
}

/// Query cost analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    pub enabled: bool,
    pub max_cost: u64,
    /// Cost of a leaf (scalar or enum) field
    pub scalar_cost: u64,
    /// Cost of a field with a selection set, before its children
    pub object_cost: u64,
    /// Assumed cardinality of a list without an explicit size argument
    pub list_multiplier: u64,
    /// Argument names that carry an explicit list size
    pub list_size_arguments: Vec<String>,
    pub ignore_introspection: bool,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_cost: 5_000,
            scalar_cost: 1,
            object_cost: 2,
            list_multiplier: 10,
            list_size_arguments: vec![
                "first".to_string(),
                "last".to_string(),
                "limit".to_string(),
                "pageSize".to_string(),
            ],
            ignore_introspection: true,
        }
    }
}

impl CostConfig {
    pub fn validate(&self) -> Result<(), ArmorError> {
        if self.list_multiplier == 0 {
            return Err(ArmorError::Config(
                "cost.list_multiplier must be at least 1".to_string(),
            ));
        }
        if self
            .list_size_arguments
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(ArmorError::Config(
                "cost.list_size_arguments must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }
}

/// Selection depth limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepthConfig {
    pub enabled: bool,
    pub max_depth: u32,
    pub ignore_introspection: bool,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 6,
            ignore_introspection: true,
        }
    }
}

/// Alias count limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasConfig {
    pub enabled: bool,
    pub max_aliases: u32,
    pub ignore_introspection: bool,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_aliases: 15,
            ignore_introspection: false,
        }
    }
}

/// Directive application limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectiveConfig {
    pub enabled: bool,
    pub max_directives: u32,
    /// Count repeated applications of the same directive on one node
    pub allow_duplicate_directives: bool,
    pub ignore_introspection: bool,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_directives: 50,
            allow_duplicate_directives: true,
            ignore_introspection: false,
        }
    }
}

/// "Did you mean" suggestion masking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSuggestionConfig {
    pub enabled: bool,
    /// Replacement text for a stripped suggestion
    pub mask: String,
}

impl Default for FieldSuggestionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mask: "[Suggestion hidden]".to_string(),
        }
    }
}

impl FieldSuggestionConfig {
    pub fn validate(&self) -> Result<(), ArmorError> {
        if self.mask.contains("Did you mean") {
            return Err(ArmorError::Config(
                "field_suggestion.mask must not itself contain a suggestion".to_string(),
            ));
        }
        Ok(())
    }
}
