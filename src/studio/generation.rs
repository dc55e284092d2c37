//! Primary workflow: one lesson generation per submit.

use tracing::warn;

use crate::domain::{ContentModel, GenerationRequest};
use crate::protocol::{Envelope, ErrorKind, Failure, MALFORMED_MESSAGE};

#[derive(Clone, Debug, PartialEq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Submitting {
        request: GenerationRequest,
    },
    Succeeded {
        content: ContentModel,
        generation_time_ms: Option<u64>,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl GenerationState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, GenerationState::Submitting { .. })
    }

    pub fn content(&self) -> Option<&ContentModel> {
        match self {
            GenerationState::Succeeded { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            GenerationState::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn failed(failure: &Failure) -> Self {
        GenerationState::Failed { kind: failure.kind, message: failure.display_message() }
    }

    /// Terminal state for a resolved generate call.
    pub fn resolve(envelope: Envelope<ContentModel>) -> Self {
        let generation_time_ms = envelope.generation_time_ms;
        match envelope.into_result() {
            Ok(content) => match content.validate() {
                Ok(()) => GenerationState::Succeeded { content, generation_time_ms },
                Err(reason) => {
                    warn!(target: "workflow", %reason, "Generated lesson failed validation");
                    GenerationState::Failed { kind: ErrorKind::MalformedResponse, message: MALFORMED_MESSAGE.to_string() }
                }
            },
            Err(failure) => GenerationState::failed(&failure),
        }
    }
}
