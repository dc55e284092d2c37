//! Domain models: CEFR levels, generated lessons, and the scaffolded adaptation.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Proficiency tier requested from the content API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl CefrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
        }
    }
}

impl Default for CefrLevel {
    fn default() -> Self { CefrLevel::A1 }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            other => Err(format!("unknown CEFR level '{other}' (expected A1, A2, B1, B2 or C1)")),
        }
    }
}

/// Body of `POST /api/generate`. Built once per submit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub level: CefrLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, level: CefrLevel) -> Self {
        Self { topic: topic.into(), level, variant: None }
    }

    /// Prompt variant to request; blank names fall back to the backend default.
    pub fn with_variant(mut self, variant: Option<String>) -> Self {
        self.variant = variant.filter(|v| !v.trim().is_empty());
        self
    }

    /// Topic with surrounding whitespace removed; empty means the request must not be sent.
    pub fn trimmed_topic(&self) -> &str {
        self.topic.trim()
    }
}

/// Bloom's taxonomy tag attached to every question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloomLevel {
    Remembering,
    Understanding,
    Applying,
    Analyzing,
    Evaluating,
    Creating,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub hebrew: String,
    pub english: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub stem_hebrew: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub cognitive_level: BloomLevel,
}

impl Question {
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer_index).map(String::as_str)
    }
}

/// A generated reading lesson as returned by the content API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentModel {
    pub title_hebrew: String,
    pub cefr_level: CefrLevel,
    pub text_content: String,
    #[serde(default)]
    pub vocabulary_list: Vec<VocabularyItem>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl ContentModel {
    /// Checks the invariants the client relies on when rendering a lesson.
    pub fn validate(&self) -> Result<(), String> {
        if self.title_hebrew.trim().is_empty() {
            return Err("lesson has an empty title".into());
        }
        if self.text_content.trim().is_empty() {
            return Err("lesson has an empty body".into());
        }
        if self.questions.is_empty() {
            return Err("lesson has no questions".into());
        }
        let mut seen = HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id) {
                return Err(format!("duplicate question id {}", q.id));
            }
            if q.correct_option().is_none() {
                return Err(format!(
                    "question {} has correct_answer_index {} but only {} options",
                    q.id,
                    q.correct_answer_index,
                    q.options.len()
                ));
            }
        }
        Ok(())
    }
}

/// A question reduced to what the adaptation endpoint needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: u32,
    pub text: String,
}

/// Body of `POST /api/adapt`, derived from a lesson.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptationRequest {
    pub original_text: String,
    pub original_questions: Vec<QuestionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_needs: Option<String>,
}

impl AdaptationRequest {
    pub fn from_content(content: &ContentModel, student_needs: Option<&str>) -> Self {
        Self {
            original_text: content.text_content.clone(),
            original_questions: content
                .questions
                .iter()
                .map(|q| QuestionRef { id: q.id, text: q.stem_hebrew.clone() })
                .collect(),
            student_needs: student_needs.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlossaryItem {
    pub term: String,
    pub definition: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldedQuestion {
    pub original_id: u32,
    pub hint: String,
    pub cognitive_support: String,
}

/// Simplified version of a lesson for students needing support.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptedContent {
    pub simplified_text: String,
    #[serde(default)]
    pub glossary: Vec<GlossaryItem>,
    #[serde(default)]
    pub scaffolded_questions: Vec<ScaffoldedQuestion>,
}
