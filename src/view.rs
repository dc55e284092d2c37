//! Presentation: a pure mapping from a studio snapshot to what the page shows.
//! No decisions are made here; adaptation failures simply render as "no support panel".

use serde::Serialize;

use crate::domain::{BloomLevel, CefrLevel, ContentModel, GlossaryItem, VocabularyItem};
use crate::studio::{AdaptationState, GenerationState, StudioSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct View {
    pub cycle: u64,
    pub status: Status,
    pub submit_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson: Option<LessonView>,
    pub support: SupportView,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LessonView {
    pub title: String,
    pub level: CefrLevel,
    pub body: String,
    pub vocabulary: Vec<VocabularyItem>,
    pub questions: Vec<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionView {
    pub number: usize,
    pub id: u32,
    pub stem: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub explanation: String,
    pub cognitive_level: BloomLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SupportView {
    Hidden,
    Loading,
    Ready {
        simplified_text: String,
        glossary: Vec<GlossaryItem>,
        questions: Vec<ScaffoldView>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScaffoldView {
    pub original_id: u32,
    /// Stem of the referenced question, when it exists in the current lesson.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
    pub hint: String,
    pub cognitive_support: String,
}

fn lesson_view(content: &ContentModel, generation_time_ms: Option<u64>) -> LessonView {
    LessonView {
        title: content.title_hebrew.clone(),
        level: content.cefr_level,
        body: content.text_content.clone(),
        vocabulary: content.vocabulary_list.clone(),
        questions: content
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionView {
                number: i + 1,
                id: q.id,
                stem: q.stem_hebrew.clone(),
                options: q.options.clone(),
                correct_option: q.correct_answer_index,
                explanation: q.explanation.clone(),
                cognitive_level: q.cognitive_level,
            })
            .collect(),
        generation_time_ms,
    }
}

pub fn render(snapshot: &StudioSnapshot) -> View {
    let (status, error, pending_topic, lesson) = match &snapshot.generation {
        GenerationState::Idle => (Status::Idle, None, None, None),
        GenerationState::Submitting { request } => (Status::Loading, None, Some(request.topic.clone()), None),
        GenerationState::Succeeded { content, generation_time_ms } => {
            (Status::Ready, None, None, Some(lesson_view(content, *generation_time_ms)))
        }
        GenerationState::Failed { message, .. } => (Status::Error, Some(message.clone()), None, None),
    };

    let support = match (&snapshot.adaptation, snapshot.generation.content()) {
        (AdaptationState::Requesting, Some(_)) => SupportView::Loading,
        (AdaptationState::Succeeded(adapted), Some(content)) => SupportView::Ready {
            simplified_text: adapted.simplified_text.clone(),
            glossary: adapted.glossary.clone(),
            questions: adapted
                .scaffolded_questions
                .iter()
                .map(|s| ScaffoldView {
                    original_id: s.original_id,
                    stem: content.questions.iter().find(|q| q.id == s.original_id).map(|q| q.stem_hebrew.clone()),
                    hint: s.hint.clone(),
                    cognitive_support: s.cognitive_support.clone(),
                })
                .collect(),
        },
        _ => SupportView::Hidden,
    };

    View {
        cycle: snapshot.cycle,
        status,
        submit_enabled: status != Status::Loading,
        error,
        pending_topic,
        lesson,
        support,
    }
}
