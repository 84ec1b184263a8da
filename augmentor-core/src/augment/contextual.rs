//! Contextual word substitution with a masked language model.
//!
//! Selected words are masked one at a time, left to right. Each mask sees the
//! substitutions already made, and the replacement is drawn from the model's
//! top-k fill-ins.

use super::text::{aug_count, is_stopword, make_rng, match_case, pick_ordered, splice, word_spans};
use super::{Augmenter, Technique};
use crate::config::Selection;
use crate::error::AugmentError;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

/// One fill-in proposed for a mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillMaskCandidate {
    pub token_str: String,
    #[serde(default)]
    pub score: f64,
}

/// A model that ranks fill-ins for a single masked token.
#[async_trait]
pub trait MaskedLanguageModel: Send + Sync {
    async fn fill_mask(
        &self,
        masked_text: &str,
        top_k: usize,
    ) -> Result<Vec<FillMaskCandidate>, AugmentError>;
}

/// Fill-mask over HTTP, Hugging Face inference API style.
pub struct HttpFillMask {
    client: reqwest::Client,
    url: String,
    api_token: Option<String>,
}

impl HttpFillMask {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, AugmentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            api_token,
        })
    }
}

#[async_trait]
impl MaskedLanguageModel for HttpFillMask {
    async fn fill_mask(
        &self,
        masked_text: &str,
        top_k: usize,
    ) -> Result<Vec<FillMaskCandidate>, AugmentError> {
        let mut request = self.client.post(&self.url).json(&serde_json::json!({
            "inputs": masked_text,
            "parameters": { "top_k": top_k },
        }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AugmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        parse_fill_mask_response(body)
    }
}

/// Parse a fill-mask response: a list of candidates, or a list of lists
/// when the input held several masks (only the first is used).
pub fn parse_fill_mask_response(body: Value) -> Result<Vec<FillMaskCandidate>, AugmentError> {
    let list = match body {
        Value::Array(items) if items.first().is_some_and(Value::is_array) => {
            items.into_iter().next().unwrap_or_default()
        }
        Value::Array(items) => Value::Array(items),
        Value::Object(map) if map.contains_key("error") => {
            return Err(AugmentError::invalid_response(
                "fill-mask",
                map["error"].to_string(),
            ));
        }
        other => {
            return Err(AugmentError::invalid_response(
                "fill-mask",
                format!("expected a list, got {other}"),
            ));
        }
    };
    serde_json::from_value(list)
        .map_err(|e| AugmentError::invalid_response("fill-mask", e.to_string()))
}

/// Replaces words with context-aware alternatives.
pub struct ContextualAugmenter {
    model: Box<dyn MaskedLanguageModel>,
    mask_token: String,
    top_k: usize,
    selection: Selection,
    rng: Mutex<StdRng>,
}

impl ContextualAugmenter {
    pub fn new(
        model: Box<dyn MaskedLanguageModel>,
        mask_token: &str,
        top_k: usize,
        selection: Selection,
        seed: Option<u64>,
    ) -> Self {
        Self {
            model,
            mask_token: mask_token.to_string(),
            top_k,
            selection,
            rng: Mutex::new(make_rng(seed)),
        }
    }

    fn choose_targets(&self, spans: &[Range<usize>], text: &str) -> Result<Vec<usize>, AugmentError> {
        let candidates: Vec<usize> = spans
            .iter()
            .enumerate()
            .filter(|(_, span)| {
                let word = &text[(*span).clone()];
                word.chars().any(char::is_alphabetic) && !is_stopword(word)
            })
            .map(|(i, _)| i)
            .collect();
        let count = aug_count(candidates.len(), &self.selection);
        let mut rng = self.rng.lock().map_err(|_| AugmentError::Poisoned)?;
        Ok(pick_ordered(&mut rng, &candidates, count))
    }
}

#[async_trait]
impl Augmenter for ContextualAugmenter {
    fn technique(&self) -> Technique {
        Technique::ContextualReplacement
    }

    async fn augment(&self, text: &str) -> Result<String, AugmentError> {
        let spans = word_spans(text);
        let targets = self.choose_targets(&spans, text)?;

        let mut replacements: Vec<(Range<usize>, String)> = Vec::with_capacity(targets.len());
        for idx in targets {
            let span = spans[idx].clone();
            let original = &text[span.clone()];

            let mut masked = replacements.clone();
            masked.push((span.clone(), self.mask_token.clone()));
            let proposals = self
                .model
                .fill_mask(&splice(text, &masked), self.top_k)
                .await?;

            let usable: Vec<&str> = proposals
                .iter()
                .take(self.top_k)
                .map(|c| c.token_str.trim())
                .filter(|token| is_usable_fill(token, original))
                .collect();

            let picked = {
                let mut rng = self.rng.lock().map_err(|_| AugmentError::Poisoned)?;
                usable.choose(&mut *rng).map(|s| s.to_string())
            };
            if let Some(word) = picked {
                replacements.push((span, match_case(original, &word)));
            }
        }
        Ok(splice(text, &replacements))
    }
}

/// Sub-word pieces, special tokens, punctuation and the original word itself
/// are not valid replacements.
fn is_usable_fill(token: &str, original: &str) -> bool {
    !token.is_empty()
        && !token.starts_with("##")
        && token.chars().all(|c| c.is_alphabetic() || c == '\'')
        && !token.eq_ignore_ascii_case(original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    /// Proposes fixed fill-ins and records every masked input.
    struct FixedModel {
        fills: Vec<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MaskedLanguageModel for Arc<FixedModel> {
        async fn fill_mask(
            &self,
            masked_text: &str,
            top_k: usize,
        ) -> Result<Vec<FillMaskCandidate>, AugmentError> {
            self.seen.lock().unwrap().push(masked_text.to_string());
            Ok(self
                .fills
                .iter()
                .take(top_k)
                .map(|f| FillMaskCandidate {
                    token_str: f.to_string(),
                    score: 0.1,
                })
                .collect())
        }
    }

    fn augmenter(model: Arc<FixedModel>, selection: Selection) -> ContextualAugmenter {
        ContextualAugmenter::new(Box::new(model), "[MASK]", 10, selection, Some(3))
    }

    #[test]
    fn test_parse_flat_and_nested_responses() {
        let flat = json!([
            {"score": 0.5, "token": 1, "token_str": "dog", "sequence": "the dog sat"},
            {"score": 0.2, "token": 2, "token_str": "cat", "sequence": "the cat sat"}
        ]);
        let parsed = parse_fill_mask_response(flat).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].token_str, "dog");

        let nested = json!([[{"score": 0.5, "token_str": "x"}], [{"score": 0.4, "token_str": "y"}]]);
        assert_eq!(parse_fill_mask_response(nested).unwrap()[0].token_str, "x");

        assert!(parse_fill_mask_response(json!({"error": "loading"})).is_err());
    }

    #[test]
    fn test_usable_fill_filter() {
        assert!(is_usable_fill("kitten", "cat"));
        assert!(!is_usable_fill("##ing", "cat"));
        assert!(!is_usable_fill("Cat", "cat"));
        assert!(!is_usable_fill(",", "cat"));
        assert!(!is_usable_fill("[UNK]", "cat"));
    }

    #[tokio::test]
    async fn test_replaces_one_word_and_keeps_layout() {
        let model = Arc::new(FixedModel {
            fills: vec!["##s", "cat", "kitten"],
            seen: Mutex::new(Vec::new()),
        });
        let selection = Selection {
            aug_p: 0.1,
            aug_min: 1,
            aug_max: 1,
        };
        let aug = augmenter(Arc::clone(&model), selection);

        let out = aug.augment("The cat sat.").await.unwrap();
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("[MASK]"));
        assert!(seen[0].starts_with("The "));
        assert!(out.starts_with("The "));
        assert!(out.ends_with('.'));
        assert!(out.contains("kitten") || out.contains("cat"));
        assert_ne!(out, "The cat sat.");
    }

    #[tokio::test]
    async fn test_masks_see_earlier_substitutions() {
        let model = Arc::new(FixedModel {
            fills: vec!["blue"],
            seen: Mutex::new(Vec::new()),
        });
        let selection = Selection {
            aug_p: 1.0,
            aug_min: 1,
            aug_max: 10,
        };
        let aug = augmenter(Arc::clone(&model), selection);

        let out = aug.augment("Red apples, green pears").await.unwrap();
        assert_eq!(out, "Blue blue, blue blue");
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0], "[MASK] apples, green pears");
        assert_eq!(seen[3], "Blue blue, blue [MASK]");
    }

    #[tokio::test]
    async fn test_only_stopwords_is_unchanged() {
        let model = Arc::new(FixedModel {
            fills: vec!["dog"],
            seen: Mutex::new(Vec::new()),
        });
        let aug = augmenter(Arc::clone(&model), Selection::default());
        assert_eq!(aug.augment("it is the").await.unwrap(), "it is the");
        assert!(model.seen.lock().unwrap().is_empty());
    }
}
