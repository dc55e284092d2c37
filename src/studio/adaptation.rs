//! Dependent workflow: scaffolded version of the current lesson.
//! Failures here are logged and never shown.

use tracing::{info, warn};

use crate::domain::AdaptedContent;
use crate::protocol::{Envelope, ErrorKind};

#[derive(Clone, Debug, PartialEq, Default)]
pub enum AdaptationState {
    #[default]
    Dormant,
    Requesting,
    Succeeded(AdaptedContent),
    /// Kept for diagnostics only; the view never renders it.
    Failed { kind: ErrorKind },
}

impl AdaptationState {
    pub fn adapted(&self) -> Option<&AdaptedContent> {
        match self {
            AdaptationState::Succeeded(adapted) => Some(adapted),
            _ => None,
        }
    }

    pub fn resolve(cycle: u64, envelope: Envelope<AdaptedContent>) -> Self {
        match envelope.into_result() {
            Ok(adapted) => {
                info!(target: "workflow", cycle, glossary = adapted.glossary.len(), scaffolded = adapted.scaffolded_questions.len(), "Adaptation received");
                AdaptationState::Succeeded(adapted)
            }
            Err(failure) => {
                warn!(target: "workflow", cycle, kind = failure.kind.as_code(), code = ?failure.code, message = ?failure.message, "Adaptation failed; lesson stays visible without scaffolding");
                AdaptationState::Failed { kind: failure.kind }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::adapted;

    #[test]
    fn error_field_on_success_fails_silently() {
        let env = Envelope { error: Some("MODEL_UNAVAILABLE".into()), ..Envelope::ok(adapted("פָּשׁוּט")) };
        assert_eq!(AdaptationState::resolve(1, env), AdaptationState::Failed { kind: ErrorKind::ApplicationError });
    }

    #[test]
    fn clean_success_is_stored() {
        let state = AdaptationState::resolve(3, Envelope::ok(adapted("פָּשׁוּט")));
        assert_eq!(state.adapted(), Some(&adapted("פָּשׁוּט")));
    }
}
