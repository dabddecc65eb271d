use super::{Guard, GuardKind};
use crate::config::FieldSuggestionConfig;
use crate::error::{ArmorError, ResponseError};
use std::borrow::Cow;
use tracing::debug;

const SUGGESTION_PREFIX: &str = "Did you mean";

/// Hides "Did you mean ...?" suggestions in outgoing error messages.
///
/// Schema validators suggest similarly named fields, arguments and types when
/// a name is misspelled, which lets anyone enumerate the schema with
/// introspection disabled. The suggestion sentence is replaced by the mask;
/// the rest of the message and the error itself are kept.
#[derive(Debug, Clone)]
pub struct FieldSuggestionGuard {
    config: FieldSuggestionConfig,
}

impl FieldSuggestionGuard {
    pub fn new(config: FieldSuggestionConfig) -> Result<Self, ArmorError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Replace every suggestion sentence in `message` with the mask.
    pub fn mask<'m>(&self, message: &'m str) -> Cow<'m, str> {
        if !message.contains(SUGGESTION_PREFIX) {
            return Cow::Borrowed(message);
        }

        let mut masked = String::with_capacity(message.len());
        let mut rest = message;
        while let Some(start) = rest.find(SUGGESTION_PREFIX) {
            masked.push_str(&rest[..start]);
            masked.push_str(&self.config.mask);
            let suggestion = &rest[start..];
            rest = match suggestion.find('?') {
                Some(end) => &suggestion[end + 1..],
                None => "",
            };
        }
        masked.push_str(rest);
        Cow::Owned(masked)
    }
}

impl Guard for FieldSuggestionGuard {
    fn kind(&self) -> GuardKind {
        GuardKind::FieldSuggestion
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn mask_error(&self, error: &mut ResponseError) {
        let masked = match self.mask(&error.message) {
            Cow::Owned(masked) => masked,
            Cow::Borrowed(_) => return,
        };
        debug!("Masked field suggestion in error message");
        error.message = masked;
    }

    fn validates(&self) -> bool {
        false
    }

    fn rewrites_errors(&self) -> bool {
        true
    }
}
