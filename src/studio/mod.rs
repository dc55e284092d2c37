//! The studio: generation and adaptation workflows composed by one rule,
//! "on generation success, start adaptation for the same cycle".
//!
//! State lives in a single `StudioSnapshot` held by a `watch` channel. Every
//! transition replaces or modifies that snapshot atomically, and observers
//! (WebSocket sessions) subscribe to it. Each submit allocates a new cycle id;
//! any response tagged with an older cycle is dropped.

use std::sync::Arc;

use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::domain::{AdaptationRequest, ContentModel, GenerationRequest};
use crate::protocol::Failure;
use crate::transport::LessonApi;
use crate::util::log_safe;

pub mod adaptation;
pub mod generation;

pub use adaptation::AdaptationState;
pub use generation::GenerationState;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct StudioSnapshot {
    /// Monotonic id of the current generation cycle (0 before the first submit).
    pub cycle: u64,
    pub generation: GenerationState,
    pub adaptation: AdaptationState,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("a lesson is already being generated")]
    Busy,
}

/// Handle returned once the generation call has resolved.
#[derive(Debug)]
pub struct Submitted {
    pub cycle: u64,
    /// Background adaptation task, present when generation succeeded.
    pub adaptation: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct Studio {
    api: Arc<dyn LessonApi>,
    state: Arc<watch::Sender<StudioSnapshot>>,
    student_needs: Option<String>,
}

impl Studio {
    pub fn new(api: Arc<dyn LessonApi>, student_needs: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(StudioSnapshot::default());
        Self { api, state: Arc::new(tx), student_needs }
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StudioSnapshot> {
        self.state.subscribe()
    }

    /// Run one generation cycle. Returns after the generate call resolves; the
    /// adaptation (if any) keeps running in the background.
    #[instrument(level = "info", skip(self, request), fields(level = %request.level, topic = %log_safe(&request.topic)))]
    pub async fn submit(&self, request: GenerationRequest) -> Result<Submitted, SubmitError> {
        let topic = request.trimmed_topic().to_string();
        if topic.is_empty() {
            warn!(target: "workflow", "Rejected submit with empty topic");
            return Err(SubmitError::EmptyTopic);
        }
        let request = GenerationRequest { topic, ..request };

        let mut cycle = None;
        self.state.send_if_modified(|s| {
            if s.generation.is_in_flight() {
                return false;
            }
            s.cycle += 1;
            s.generation = GenerationState::Submitting { request: request.clone() };
            s.adaptation = AdaptationState::Dormant;
            cycle = Some(s.cycle);
            true
        });
        let Some(cycle) = cycle else {
            warn!(target: "workflow", "Rejected submit while a generation is in flight");
            return Err(SubmitError::Busy);
        };
        info!(target: "workflow", cycle, "Generation started");

        let studio = self.clone();
        let run = tokio::spawn(studio.run_cycle(cycle, request).in_current_span());
        match run.await {
            Ok(submitted) => Ok(submitted),
            Err(e) => {
                error!(target: "workflow", cycle, error = %e, "Generation cycle aborted");
                self.state.send_if_modified(|s| {
                    if s.cycle != cycle || !s.generation.is_in_flight() {
                        return false;
                    }
                    s.generation = GenerationState::failed(&Failure::connectivity());
                    true
                });
                Ok(Submitted { cycle, adaptation: None })
            }
        }
    }

    /// Generate, apply the outcome if `cycle` is still current, and start the
    /// adaptation on success. Runs detached from the caller so a dropped
    /// submit still leaves the cycle terminal.
    async fn run_cycle(self, cycle: u64, request: GenerationRequest) -> Submitted {
        let api = self.api.clone();
        let outcome = match tokio::spawn(async move { api.generate(&request).await }).await {
            Ok(envelope) => GenerationState::resolve(envelope),
            Err(e) => {
                error!(target: "workflow", cycle, error = %e, "Generate call aborted");
                GenerationState::failed(&Failure::connectivity())
            }
        };

        let content = outcome.content().cloned();
        match &outcome {
            GenerationState::Succeeded { generation_time_ms, .. } => {
                info!(target: "workflow", cycle, ?generation_time_ms, "Generation succeeded")
            }
            GenerationState::Failed { kind, message } => {
                warn!(target: "workflow", cycle, kind = kind.as_code(), %message, "Generation failed")
            }
            _ => {}
        }

        let applied = self.state.send_if_modified(|s| {
            if s.cycle != cycle {
                return false;
            }
            if content.is_some() {
                s.adaptation = AdaptationState::Requesting;
            }
            s.generation = outcome;
            true
        });
        if !applied {
            debug!(target: "workflow", cycle, "Discarding stale generation response");
            return Submitted { cycle, adaptation: None };
        }

        let adaptation = content.map(|content| self.start_adaptation(cycle, &content));
        Submitted { cycle, adaptation }
    }

    /// Back to idle. Refused while a generation is in flight; bumps the cycle
    /// so a pending adaptation response is dropped.
    #[instrument(level = "info", skip(self))]
    pub fn reset(&self) -> Result<(), SubmitError> {
        let mut busy = false;
        self.state.send_if_modified(|s| {
            if s.generation.is_in_flight() {
                busy = true;
                return false;
            }
            s.cycle += 1;
            s.generation = GenerationState::Idle;
            s.adaptation = AdaptationState::Dormant;
            true
        });
        if busy {
            return Err(SubmitError::Busy);
        }
        info!(target: "workflow", "Studio reset");
        Ok(())
    }

    fn start_adaptation(&self, cycle: u64, content: &ContentModel) -> JoinHandle<()> {
        let request = AdaptationRequest::from_content(content, self.student_needs.as_deref());
        let api = self.api.clone();
        let state = self.state.clone();
        let span = tracing::info_span!("adaptation", cycle);

        tokio::spawn(
            async move {
                let next = match tokio::spawn(async move { api.adapt(&request).await }).await {
                    Ok(envelope) => AdaptationState::resolve(cycle, envelope),
                    Err(e) => {
                        warn!(target: "workflow", cycle, error = %e, "Adapt call aborted");
                        AdaptationState::resolve(cycle, Failure::connectivity().into_envelope())
                    }
                };
                let applied = state.send_if_modified(|s| {
                    if s.cycle != cycle {
                        return false;
                    }
                    s.adaptation = next;
                    true
                });
                if !applied {
                    debug!(target: "workflow", cycle, "Discarding stale adaptation response");
                }
            }
            .instrument(span),
        )
    }
}
