//! Thesaurus-based synonym substitution.

use super::text::{aug_count, is_stopword, make_rng, match_case, pick_ordered, splice, word_spans};
use super::{Augmenter, Technique};
use crate::config::Selection;
use crate::error::{AugmentError, AugmentorError, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Mutex;

static BUNDLED_THESAURUS: &str = include_str!("../../data/thesaurus.txt");

/// Source of synonyms for a single word.
pub trait Thesaurus: Send + Sync {
    /// Synonyms of `word`, excluding the word itself. Empty when unknown.
    fn synonyms(&self, word: &str) -> Vec<String>;
}

/// Thesaurus in the Moby comma-separated format: one root word per line
/// followed by its synonyms.
#[derive(Debug, Clone, Default)]
pub struct MobyThesaurus {
    entries: HashMap<String, Vec<String>>,
}

impl MobyThesaurus {
    /// The small general-purpose word list shipped with the crate.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_THESAURUS)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let thesaurus = Self::parse(&text);
        if thesaurus.is_empty() {
            return Err(AugmentorError::Augment(AugmentError::Thesaurus(format!(
                "no entries in {}",
                path.display()
            ))));
        }
        tracing::info!(
            path = %path.display(),
            entries = thesaurus.len(),
            "Loaded thesaurus"
        );
        Ok(thesaurus)
    }

    /// Parse thesaurus text. Blank lines and `#` comments are skipped,
    /// underscores in multi-word entries become spaces.
    ///
    /// Substitution works on single words, so lines whose root spans several
    /// words are dropped. Multi-word synonyms are kept as replacements.
    pub fn parse(text: &str) -> Self {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line
                .split(',')
                .map(|f| f.trim().replace('_', " "))
                .filter(|f| !f.is_empty());
            let Some(root) = fields.next() else {
                continue;
            };
            if root.contains(char::is_whitespace) {
                continue;
            }
            let root = root.to_lowercase();
            let list = entries.entry(root.clone()).or_default();
            for synonym in fields {
                if !synonym.eq_ignore_ascii_case(&root) && !list.contains(&synonym) {
                    list.push(synonym);
                }
            }
        }
        entries.retain(|_, list| !list.is_empty());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Thesaurus for MobyThesaurus {
    fn synonyms(&self, word: &str) -> Vec<String> {
        self.entries
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

/// Replaces words with a randomly chosen synonym.
pub struct SynonymAugmenter {
    thesaurus: Box<dyn Thesaurus>,
    selection: Selection,
    rng: Mutex<StdRng>,
}

impl SynonymAugmenter {
    pub fn new(thesaurus: Box<dyn Thesaurus>, selection: Selection, seed: Option<u64>) -> Self {
        Self {
            thesaurus,
            selection,
            rng: Mutex::new(make_rng(seed)),
        }
    }
}

#[async_trait]
impl Augmenter for SynonymAugmenter {
    fn technique(&self) -> Technique {
        Technique::SynonymReplacement
    }

    async fn augment(&self, text: &str) -> std::result::Result<String, AugmentError> {
        // Only words the thesaurus knows count as candidates.
        let candidates: Vec<(Range<usize>, Vec<String>)> = word_spans(text)
            .into_iter()
            .filter(|span| !is_stopword(&text[span.clone()]))
            .filter_map(|span| {
                let synonyms = self.thesaurus.synonyms(&text[span.clone()]);
                (!synonyms.is_empty()).then_some((span, synonyms))
            })
            .collect();

        let count = aug_count(candidates.len(), &self.selection);
        let indices: Vec<usize> = (0..candidates.len()).collect();

        let replacements: Vec<(Range<usize>, String)> = {
            let mut rng = self.rng.lock().map_err(|_| AugmentError::Poisoned)?;
            let chosen = pick_ordered(&mut rng, &indices, count);
            chosen
                .into_iter()
                .filter_map(|i| {
                    let (span, synonyms) = &candidates[i];
                    let original = &text[span.clone()];
                    synonyms
                        .choose(&mut *rng)
                        .map(|synonym| (span.clone(), match_case(original, synonym)))
                })
                .collect()
        };

        Ok(splice(text, &replacements))
    }
}
