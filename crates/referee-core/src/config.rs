//! Evaluation-matrix configuration: which languages, prompt modes and
//! responding models a run sweeps over.
//!
//! The built-in defaults carry the full study matrix; a YAML file with the
//! same shape can replace them. Loaded once at startup and passed
//! explicitly, never read from ambient globals.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{unknown_name_error, ConfigError};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub code: String,
    pub name: String,
}

/// A prompting mode. `prompt_suffix` is what the response generator appends
/// to the question per language; it is carried here because the matrix file
/// is shared with the generator, but judging never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompt_suffix: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    /// Short display label used in reports.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalMatrix {
    #[serde(default = "default_version")]
    pub version: u32,
    pub languages: Vec<LanguageSpec>,
    pub modes: Vec<ModeSpec>,
    pub models: Vec<ModelSpec>,
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

impl EvalMatrix {
    pub fn language_codes(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.code.clone()).collect()
    }

    pub fn mode_names(&self) -> Vec<String> {
        self.modes.iter().map(|m| m.name.clone()).collect()
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.models.iter().map(|m| m.id.clone()).collect()
    }

    pub fn language(&self, code: &str) -> Result<&LanguageSpec, ConfigError> {
        self.languages
            .iter()
            .find(|l| l.code == code)
            .ok_or_else(|| unknown_name_error("language", code, self.language_codes().iter()))
    }

    pub fn mode(&self, name: &str) -> Result<&ModeSpec, ConfigError> {
        self.modes
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| unknown_name_error("mode", name, self.mode_names().iter()))
    }

    pub fn model(&self, id: &str) -> Result<&ModelSpec, ConfigError> {
        self.models
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| unknown_name_error("model", id, self.model_ids().iter()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError(format!(
                "unsupported matrix version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if self.languages.is_empty() {
            return Err(ConfigError("matrix has no languages".into()));
        }
        if self.modes.is_empty() {
            return Err(ConfigError("matrix has no modes".into()));
        }
        if self.models.is_empty() {
            return Err(ConfigError("matrix has no models".into()));
        }
        check_unique("language", self.languages.iter().map(|l| l.code.as_str()))?;
        check_unique("mode", self.modes.iter().map(|m| m.name.as_str()))?;
        check_unique("model", self.models.iter().map(|m| m.id.as_str()))?;
        Ok(())
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError(format!("duplicate {} '{}'", kind, name)));
        }
    }
    Ok(())
}

impl Default for EvalMatrix {
    fn default() -> Self {
        let lang = |code: &str, name: &str| LanguageSpec {
            code: code.into(),
            name: name.into(),
        };
        let suffix = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        let model = |id: &str, label: &str, color: &str| ModelSpec {
            id: id.into(),
            label: label.into(),
            color: Some(color.into()),
        };
        EvalMatrix {
            version: SUPPORTED_CONFIG_VERSION,
            languages: vec![
                lang("en", "English"),
                lang("fr", "French"),
                lang("ar", "Arabic"),
                lang("ru", "Russian"),
                lang("zh", "Chinese"),
            ],
            modes: vec![
                ModeSpec {
                    name: "simple".into(),
                    prompt_suffix: suffix(&[
                        ("en", " Please answer in simple language."),
                        ("fr", " Veuillez répondre dans un langage simple."),
                        ("ru", " Пожалуйста, отвечайте простым языком."),
                        ("ar", " يرجى الإجابة بلغة بسيطة."),
                        ("zh", " 请用通俗易懂的语言回答。"),
                    ]),
                },
                ModeSpec {
                    name: "normal".into(),
                    prompt_suffix: BTreeMap::new(),
                },
                ModeSpec {
                    name: "cot_normal".into(),
                    prompt_suffix: suffix(&[(
                        "en",
                        " First, try resolving any ambiguity using commonsense knowledge. \
                         If the question remains ambiguous, your answer should be a \
                         clarification request. Otherwise, provide the answer. Put your \
                         final response after Response:.",
                    )]),
                },
                ModeSpec {
                    name: "cot_simple".into(),
                    prompt_suffix: suffix(&[(
                        "en",
                        " First, try resolving any ambiguity using commonsense knowledge. \
                         If the question remains ambiguous, your answer should be a \
                         clarification request. Otherwise, provide the answer. Put your \
                         final response after Response:. Please answer in simple language.",
                    )]),
                },
            ],
            models: vec![
                model("gpt-4o", "4o", "#018571"),
                model("gpt-4o-mini", "4o-mini", "#dfc27d"),
                model("deepseek-v3", "DS-v3", "#a6611a"),
                model("qwen3-32b", "Q-32B", "#80cdc1"),
                model("llama-8b", "L-8B", "#9467bd"),
                model("dpo-llama", "DPO-L-8B", "#8c564b"),
            ],
        }
    }
}

pub fn load_matrix(path: &Path) -> Result<EvalMatrix, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read matrix {}: {}", path.display(), e)))?;
    let matrix: EvalMatrix = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    matrix.validate()?;
    Ok(matrix)
}
