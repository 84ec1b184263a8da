//! Text augmenters.
//!
//! Each technique implements [`Augmenter`]. The batch runner never calls
//! `augment` directly; it goes through [`apply_augmenter`], which skips
//! non-text values and turns failures into the original text.

pub mod back_translation;
pub mod contextual;
pub mod random_char;
pub mod synonym;
pub mod text;

pub use back_translation::{BackTranslationAugmenter, GoogleTranslator, Translator};
pub use contextual::{ContextualAugmenter, FillMaskCandidate, HttpFillMask, MaskedLanguageModel};
pub use random_char::{CharAction, RandomCharAugmenter};
pub use synonym::{MobyThesaurus, SynonymAugmenter, Thesaurus};

use crate::config::AugmentorConfig;
use crate::error::{AugmentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One text-augmentation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    BackTranslation,
    ContextualReplacement,
    SynonymReplacement,
    RandomAugmentations,
}

impl Technique {
    pub const ALL: [Technique; 4] = [
        Technique::BackTranslation,
        Technique::ContextualReplacement,
        Technique::SynonymReplacement,
        Technique::RandomAugmentations,
    ];

    /// Name used for the output directory, CSV files and collection suffix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BackTranslation => "Back_Translation",
            Self::ContextualReplacement => "Contextual_Replacement",
            Self::SynonymReplacement => "Synonym_Replacement",
            Self::RandomAugmentations => "Random_Augmentations",
        }
    }

    /// Column added to every output record.
    pub fn column(&self) -> &'static str {
        match self {
            Self::BackTranslation => "Back_Translated",
            other => other.name(),
        }
    }

    /// Output collection, `augmented_<name>`.
    pub fn collection(&self) -> String {
        format!("augmented_{}", self.name())
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `text -> text` transformation.
#[async_trait]
pub trait Augmenter: Send + Sync {
    fn technique(&self) -> Technique;

    /// Augment one non-blank text.
    async fn augment(&self, text: &str) -> std::result::Result<String, AugmentError>;
}

/// Result of running the augmenter over one field value.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedValue {
    pub value: Value,
    /// The augmenter failed and the original text was kept.
    pub fell_back: bool,
}

/// Augment a field value, passing non-strings and blank strings through and
/// falling back to the original text on error.
pub async fn apply_augmenter(augmenter: &dyn Augmenter, value: &Value) -> AppliedValue {
    let text = match value {
        Value::String(text) if !text.trim().is_empty() => text,
        _ => {
            return AppliedValue {
                value: value.clone(),
                fell_back: false,
            };
        }
    };

    match augmenter.augment(text).await {
        Ok(augmented) => AppliedValue {
            value: Value::String(augmented),
            fell_back: false,
        },
        Err(e) => {
            tracing::warn!(
                technique = %augmenter.technique(),
                error = %e,
                "Augmentation failed; keeping original text"
            );
            AppliedValue {
                value: value.clone(),
                fell_back: true,
            }
        }
    }
}

/// Build the production augmenter for a technique from configuration.
pub fn build_augmenter(
    technique: Technique,
    config: &AugmentorConfig,
) -> Result<Box<dyn Augmenter>> {
    let augmenter: Box<dyn Augmenter> = match technique {
        Technique::BackTranslation => {
            let bt = &config.back_translation;
            let translator = GoogleTranslator::new(&bt.endpoint, bt.timeout_secs)?;
            Box::new(BackTranslationAugmenter::new(
                Box::new(translator),
                &bt.source_lang,
                &bt.intermediate_lang,
                bt.max_chars,
            ))
        }
        Technique::ContextualReplacement => {
            let cfg = &config.contextual;
            let model = HttpFillMask::new(
                &cfg.endpoint,
                &cfg.model,
                cfg.api_token.clone(),
                cfg.timeout_secs,
            )?;
            Box::new(ContextualAugmenter::new(
                Box::new(model),
                &cfg.mask_token,
                cfg.top_k,
                cfg.selection,
                config.seed,
            ))
        }
        Technique::SynonymReplacement => {
            let cfg = &config.synonym;
            let thesaurus = match &cfg.thesaurus_path {
                Some(path) => MobyThesaurus::from_file(path)?,
                None => MobyThesaurus::bundled(),
            };
            Box::new(SynonymAugmenter::new(
                Box::new(thesaurus),
                cfg.selection,
                config.seed,
            ))
        }
        Technique::RandomAugmentations => {
            Box::new(RandomCharAugmenter::from_config(&config.random, config.seed))
        }
    };
    tracing::debug!(technique = %technique, "Built augmenter");
    Ok(augmenter)
}
