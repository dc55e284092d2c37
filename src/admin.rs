//! Admin configuration surface: per-level prompt configuration as a structured,
//! validated schema with enumerated fields, plus the in-memory store the admin
//! endpoints edit.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::domain::{BloomLevel, CefrLevel};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tense {
    Present,
    Past,
    Future,
    Imperative,
    Infinitive,
}

/// Hebrew verb patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Binyan {
    Paal,
    Nifal,
    Piel,
    Pual,
    Hifil,
    Hufal,
    Hitpael,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderForm {
    Masculine,
    Feminine,
    PluralMasculine,
    PluralFeminine,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MorphologicalConstraints {
    pub allowed_tenses: Vec<Tense>,
    pub allowed_binyanim: Vec<Binyan>,
    /// Maximum words per sentence.
    pub max_sentence_length: u32,
    pub niqqud_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_gender_forms: Option<Vec<GenderForm>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomTaxonomyRules {
    pub distribution: HashMap<BloomLevel, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { temperature: 0.3, max_output_tokens: 2048, top_p: 0.95, top_k: 40 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub min_text_length: u32,
    pub max_text_length: u32,
    pub min_questions: u32,
    pub max_questions: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self { min_text_length: 50, max_text_length: 500, min_questions: 3, max_questions: 5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub topic: String,
    pub activity: serde_json::Value,
}

/// Complete prompt configuration for one CEFR level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    pub level: CefrLevel,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub morphological_constraints: MorphologicalConstraints,
    pub system_prompt_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_whitelist: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub few_shot_examples: Option<Vec<FewShotExample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_taxonomy_rules: Option<BloomTaxonomyRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
}

fn is_semver(v: &str) -> bool {
    let parts: Vec<&str> = v.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

impl PromptConfig {
    /// Every violated rule, in field order. Empty means the config is valid.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();

        if !is_semver(&self.version) {
            out.push(format!("version '{}' must look like MAJOR.MINOR.PATCH", self.version));
        }

        let m = &self.morphological_constraints;
        if m.allowed_tenses.is_empty() {
            out.push("morphological_constraints.allowed_tenses must not be empty".into());
        }
        if m.allowed_binyanim.is_empty() {
            out.push("morphological_constraints.allowed_binyanim must not be empty".into());
        }
        if !(5..=30).contains(&m.max_sentence_length) {
            out.push(format!(
                "morphological_constraints.max_sentence_length must be within 5..=30, got {}",
                m.max_sentence_length
            ));
        }

        let tpl = &self.system_prompt_template;
        if tpl.chars().count() < 50 {
            out.push("system_prompt_template must be at least 50 characters".into());
        }
        if !tpl.contains("{{ topic }}") && !tpl.contains("{{topic}}") {
            out.push("system_prompt_template must include the {{ topic }} placeholder".into());
        }

        if let Some(rules) = &self.bloom_taxonomy_rules {
            let total: f64 = rules.distribution.values().sum();
            if !(0.99..=1.01).contains(&total) {
                out.push(format!("bloom_taxonomy_rules.distribution must sum to 1.0, got {total:.2}"));
            }
            if rules.distribution.values().any(|v| *v < 0.0) {
                out.push("bloom_taxonomy_rules.distribution must not contain negative shares".into());
            }
        }

        if let Some(g) = &self.generation_config {
            if !(0.0..=2.0).contains(&g.temperature) {
                out.push(format!("generation_config.temperature must be within 0..=2, got {}", g.temperature));
            }
            if !(100..=8192).contains(&g.max_output_tokens) {
                out.push(format!(
                    "generation_config.max_output_tokens must be within 100..=8192, got {}",
                    g.max_output_tokens
                ));
            }
            if !(0.0..=1.0).contains(&g.top_p) {
                out.push(format!("generation_config.top_p must be within 0..=1, got {}", g.top_p));
            }
            if !(1..=100).contains(&g.top_k) {
                out.push(format!("generation_config.top_k must be within 1..=100, got {}", g.top_k));
            }
        }

        if let Some(v) = &self.validation_rules {
            if v.min_text_length < 10 {
                out.push("validation_rules.min_text_length must be at least 10".into());
            }
            if v.max_text_length < 50 {
                out.push("validation_rules.max_text_length must be at least 50".into());
            }
            if v.min_text_length > v.max_text_length {
                out.push("validation_rules.min_text_length must not exceed max_text_length".into());
            }
            if !(1..=10).contains(&v.min_questions) || !(1..=10).contains(&v.max_questions) {
                out.push("validation_rules question counts must be within 1..=10".into());
            }
            if v.min_questions > v.max_questions {
                out.push("validation_rules.min_questions must not exceed max_questions".into());
            }
        }

        out
    }
}

/// Editable prompt configurations, one per level.
#[derive(Clone, Default)]
pub struct AdminStore {
    configs: Arc<RwLock<BTreeMap<CefrLevel, PromptConfig>>>,
}

impl AdminStore {
    /// Seed from the config file; invalid entries are skipped.
    pub fn seeded(configs: &[PromptConfig]) -> Self {
        let mut map = BTreeMap::new();
        for cfg in configs {
            let problems = cfg.violations();
            if !problems.is_empty() {
                error!(target: "admin", level = %cfg.level, ?problems, "Skipping invalid seed prompt config");
                continue;
            }
            if map.insert(cfg.level, cfg.clone()).is_some() {
                warn!(target: "admin", level = %cfg.level, "Duplicate seed prompt config; keeping the last one");
            }
        }
        info!(target: "admin", count = map.len(), "Prompt configs loaded");
        Self { configs: Arc::new(RwLock::new(map)) }
    }

    pub async fn list(&self) -> Vec<PromptConfig> {
        self.configs.read().await.values().cloned().collect()
    }

    pub async fn get(&self, level: CefrLevel) -> Option<PromptConfig> {
        self.configs.read().await.get(&level).cloned()
    }

    /// Validate and store. The config's own level must match `level`.
    #[instrument(level = "info", skip(self, cfg), fields(%level, version = %cfg.version))]
    pub async fn put(&self, level: CefrLevel, cfg: PromptConfig) -> Result<PromptConfig, Vec<String>> {
        let mut problems = cfg.violations();
        if cfg.level != level {
            problems.insert(0, format!("level '{}' does not match the edited level '{}'", cfg.level, level));
        }
        if !problems.is_empty() {
            warn!(target: "admin", count = problems.len(), "Rejected prompt config");
            return Err(problems);
        }
        self.configs.write().await.insert(level, cfg.clone());
        info!(target: "admin", "Prompt config stored");
        Ok(cfg)
    }
}
