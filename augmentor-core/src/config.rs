//! Configuration system for Augmentor.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace `augmentor.toml` -> environment. CLI flags are applied by the
//! binary on top of the extracted value.

use crate::augment::Technique;
use crate::error::{AugmentorError, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-level configuration file.
pub const WORKSPACE_CONFIG_FILE: &str = "augmentor.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AugmentorConfig {
    /// Seed for every random choice made by the augmenters. Unset means entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub back_translation: BackTranslationConfig,
    #[serde(default)]
    pub contextual: ContextualConfig,
    #[serde(default)]
    pub synonym: SynonymConfig,
    #[serde(default)]
    pub random: RandomCharConfig,
}

/// Document store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file holding every collection.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("augmentor.db")
}

/// Collections, field names and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Collection holding the uncleaned articles.
    #[serde(default = "default_raw_collection")]
    pub raw_collection: String,
    /// Collection the augmenters read from.
    #[serde(default = "default_source_collection")]
    pub source_collection: String,
    /// Field carrying the text to augment.
    #[serde(default = "default_text_field")]
    pub text_field: String,
    /// Root directory for CSV output.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_collection: default_raw_collection(),
            source_collection: default_source_collection(),
            text_field: default_text_field(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_raw_collection() -> String {
    "My_Project".to_string()
}

fn default_source_collection() -> String {
    "cleaned_data".to_string()
}

fn default_text_field() -> String {
    "article".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("augmentation_results")
}

/// How many words of a text get augmented.
///
/// The count is `ceil(aug_p * candidates)` clamped to `[aug_min, aug_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default = "default_aug_p")]
    pub aug_p: f64,
    #[serde(default = "default_aug_min")]
    pub aug_min: usize,
    #[serde(default = "default_aug_max")]
    pub aug_max: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            aug_p: default_aug_p(),
            aug_min: default_aug_min(),
            aug_max: default_aug_max(),
        }
    }
}

impl Selection {
    fn validate(&self, section: &str) -> Result<()> {
        if !(self.aug_p > 0.0 && self.aug_p <= 1.0) {
            return Err(AugmentorError::config(format!(
                "{section}: aug_p must be in (0, 1], got {}",
                self.aug_p
            )));
        }
        if self.aug_min > self.aug_max {
            return Err(AugmentorError::config(format!(
                "{section}: aug_min ({}) exceeds aug_max ({})",
                self.aug_min, self.aug_max
            )));
        }
        Ok(())
    }
}

fn default_aug_p() -> f64 {
    0.3
}

fn default_aug_min() -> usize {
    1
}

fn default_aug_max() -> usize {
    10
}

/// Back-translation through an intermediate language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackTranslationConfig {
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_intermediate_lang")]
    pub intermediate_lang: String,
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,
    /// Longest text sent in one request; longer texts are split on sentences.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl Default for BackTranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            intermediate_lang: default_intermediate_lang(),
            endpoint: default_translate_endpoint(),
            max_chars: default_max_chars(),
            timeout_secs: default_http_timeout(),
            batch_size: None,
        }
    }
}

fn default_source_lang() -> String {
    "en".to_string()
}

fn default_intermediate_lang() -> String {
    "fr".to_string()
}

fn default_translate_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_max_chars() -> usize {
    5000
}

fn default_http_timeout() -> u64 {
    30
}

/// Contextual word substitution backed by a fill-mask model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextualConfig {
    #[serde(default = "default_mlm_model")]
    pub model: String,
    /// Base URL; the model name is appended as a path segment.
    #[serde(default = "default_mlm_endpoint")]
    pub endpoint: String,
    /// Bearer token for the inference endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default = "default_mask_token")]
    pub mask_token: String,
    /// Candidate pool size requested per masked word.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_mlm_timeout")]
    pub timeout_secs: u64,
    #[serde(
        default = "default_contextual_batch",
        skip_serializing_if = "Option::is_none"
    )]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub selection: Selection,
}

impl Default for ContextualConfig {
    fn default() -> Self {
        Self {
            model: default_mlm_model(),
            endpoint: default_mlm_endpoint(),
            api_token: None,
            mask_token: default_mask_token(),
            top_k: default_top_k(),
            timeout_secs: default_mlm_timeout(),
            batch_size: default_contextual_batch(),
            selection: Selection::default(),
        }
    }
}

fn default_mlm_model() -> String {
    "distilbert-base-uncased".to_string()
}

fn default_mlm_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_mask_token() -> String {
    "[MASK]".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_mlm_timeout() -> u64 {
    60
}

fn default_contextual_batch() -> Option<usize> {
    Some(10)
}

/// Thesaurus-based synonym substitution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymConfig {
    /// Moby-format thesaurus file; the bundled word list is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thesaurus_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub selection: Selection,
}

/// Character-level insert, delete and swap noise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomCharConfig {
    /// Words shorter than this are left alone.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    /// Extra characters that may be inserted besides ASCII letters and digits.
    #[serde(default)]
    pub special_chars: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Which words are perturbed.
    #[serde(default)]
    pub words: Selection,
    /// How many characters of a chosen word are perturbed.
    #[serde(default)]
    pub chars: Selection,
}

impl Default for RandomCharConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            special_chars: String::new(),
            batch_size: None,
            words: Selection::default(),
            chars: Selection::default(),
        }
    }
}

fn default_min_chars() -> usize {
    4
}

impl AugmentorConfig {
    /// Configured batch size for a technique; `None` means one batch.
    pub fn batch_size_for(&self, technique: Technique) -> Option<usize> {
        match technique {
            Technique::BackTranslation => self.back_translation.batch_size,
            Technique::ContextualReplacement => self.contextual.batch_size,
            Technique::SynonymReplacement => self.synonym.batch_size,
            Technique::RandomAugmentations => self.random.batch_size,
        }
    }

    /// Override the batch size of one technique.
    pub fn set_batch_size(&mut self, technique: Technique, size: Option<usize>) {
        let slot = match technique {
            Technique::BackTranslation => &mut self.back_translation.batch_size,
            Technique::ContextualReplacement => &mut self.contextual.batch_size,
            Technique::SynonymReplacement => &mut self.synonym.batch_size,
            Technique::RandomAugmentations => &mut self.random.batch_size,
        };
        *slot = size;
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        for technique in Technique::ALL {
            if self.batch_size_for(technique) == Some(0) {
                return Err(AugmentorError::config(format!(
                    "{}: batch_size must be at least 1",
                    technique.name()
                )));
            }
        }
        if self.data.text_field.is_empty() {
            return Err(AugmentorError::config("data.text_field must not be empty"));
        }
        if self.back_translation.max_chars == 0 {
            return Err(AugmentorError::config(
                "back_translation.max_chars must be at least 1",
            ));
        }
        if self.contextual.top_k == 0 {
            return Err(AugmentorError::config("contextual.top_k must be at least 1"));
        }
        self.contextual.selection.validate("contextual.selection")?;
        self.synonym.selection.validate("synonym.selection")?;
        self.random.words.validate("random.words")?;
        self.random.chars.validate("random.chars")?;
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `AUGMENTOR_`, `__` between sections)
/// 2. Workspace config (`augmentor.toml`)
/// 3. User config (`~/.config/augmentor/config.toml`)
/// 4. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
) -> std::result::Result<AugmentorConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(AugmentorConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // AUGMENTOR_STORE__PATH, AUGMENTOR_CONTEXTUAL__API_TOKEN, ...
    figment = figment.merge(Env::prefixed("AUGMENTOR_").split("__"));

    figment.extract().map_err(Box::new)
}

/// Location of the user-level configuration file, when a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "augmentor", "augmentor")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AugmentorConfig::default();
        assert_eq!(config.data.source_collection, "cleaned_data");
        assert_eq!(config.data.text_field, "article");
        assert_eq!(config.back_translation.intermediate_lang, "fr");
        assert_eq!(config.contextual.top_k, 10);
        assert_eq!(config.batch_size_for(Technique::ContextualReplacement), Some(10));
        assert_eq!(config.batch_size_for(Technique::BackTranslation), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = AugmentorConfig::default();
        config.set_batch_size(Technique::SynonymReplacement, Some(0));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Synonym_Replacement"));
    }

    #[test]
    fn test_bad_selection_rejected() {
        let mut config = AugmentorConfig::default();
        config.random.chars.aug_min = 5;
        config.random.chars.aug_max = 2;
        assert!(config.validate().is_err());

        let mut config = AugmentorConfig::default();
        config.synonym.selection.aug_p = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_workspace_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(WORKSPACE_CONFIG_FILE),
            r#"
seed = 7

[data]
output_dir = "out"

[contextual]
batch_size = 25
top_k = 5
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.data.output_dir, PathBuf::from("out"));
        assert_eq!(config.data.source_collection, "cleaned_data");
        assert_eq!(config.contextual.batch_size, Some(25));
        assert_eq!(config.contextual.top_k, 5);
        assert_eq!(config.contextual.model, "distilbert-base-uncased");
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let config = AugmentorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[back_translation]"));
        assert!(text.contains("[random.chars]"));
        let parsed: AugmentorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.contextual.batch_size, Some(10));
    }
}
