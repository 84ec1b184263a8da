//! Character-level noise: random insertions, deletions and adjacent swaps.

use super::text::{aug_count, make_rng, pick_ordered, splice, word_spans};
use super::{Augmenter, Technique};
use crate::config::{RandomCharConfig, Selection};
use crate::error::AugmentError;
use async_trait::async_trait;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Mutex;

/// One character-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharAction {
    Insert,
    Delete,
    /// Swap with the next character (the previous one at the end of a word).
    Swap,
}

/// Applies its actions in order, each over a fresh selection of words.
pub struct RandomCharAugmenter {
    actions: Vec<CharAction>,
    min_chars: usize,
    insert_pool: Vec<char>,
    words: Selection,
    chars: Selection,
    rng: Mutex<StdRng>,
}

impl RandomCharAugmenter {
    pub fn new(
        actions: Vec<CharAction>,
        config: &RandomCharConfig,
        seed: Option<u64>,
    ) -> Self {
        let mut insert_pool: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
        for c in config.special_chars.chars() {
            if !insert_pool.contains(&c) {
                insert_pool.push(c);
            }
        }
        Self {
            actions,
            min_chars: config.min_chars,
            insert_pool,
            words: config.words,
            chars: config.chars,
            rng: Mutex::new(make_rng(seed)),
        }
    }

    /// Insert, then delete, then swap.
    pub fn from_config(config: &RandomCharConfig, seed: Option<u64>) -> Self {
        Self::new(
            vec![CharAction::Insert, CharAction::Delete, CharAction::Swap],
            config,
            seed,
        )
    }

    fn apply(&self, rng: &mut StdRng, text: &str, action: CharAction) -> String {
        let candidates: Vec<Range<usize>> = word_spans(text)
            .into_iter()
            .filter(|span| text[span.clone()].chars().count() >= self.min_chars)
            .collect();
        let count = aug_count(candidates.len(), &self.words);
        let indices: Vec<usize> = (0..candidates.len()).collect();

        let replacements: Vec<(Range<usize>, String)> = pick_ordered(rng, &indices, count)
            .into_iter()
            .map(|i| {
                let span = candidates[i].clone();
                let word = self.perturb_word(rng, &text[span.clone()], action);
                (span, word)
            })
            .collect();
        splice(text, &replacements)
    }

    fn perturb_word(&self, rng: &mut StdRng, word: &str, action: CharAction) -> String {
        let mut chars: Vec<char> = word.chars().collect();
        let len = chars.len();
        let positions: Vec<usize> = (0..len).collect();

        match action {
            CharAction::Insert => {
                let count = aug_count(len, &self.chars);
                for pos in pick_ordered(rng, &positions, count).into_iter().rev() {
                    let c = self.insert_pool[rng.gen_range(0..self.insert_pool.len())];
                    chars.insert(pos, c);
                }
            }
            CharAction::Delete => {
                // Never delete the whole word.
                let count = aug_count(len, &self.chars).min(len.saturating_sub(1));
                for pos in pick_ordered(rng, &positions, count).into_iter().rev() {
                    chars.remove(pos);
                }
            }
            CharAction::Swap => {
                if len < 2 {
                    return word.to_string();
                }
                let count = aug_count(len, &self.chars);
                for pos in pick_ordered(rng, &positions, count) {
                    let other = if pos + 1 < len { pos + 1 } else { pos - 1 };
                    chars.swap(pos, other);
                }
            }
        }
        chars.into_iter().collect()
    }
}

#[async_trait]
impl Augmenter for RandomCharAugmenter {
    fn technique(&self) -> Technique {
        Technique::RandomAugmentations
    }

    async fn augment(&self, text: &str) -> Result<String, AugmentError> {
        let mut rng = self.rng.lock().map_err(|_| AugmentError::Poisoned)?;
        let mut current = text.to_string();
        for action in &self.actions {
            current = self.apply(&mut rng, &current, *action);
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chars: Selection) -> RandomCharConfig {
        RandomCharConfig {
            words: Selection {
                aug_p: 1.0,
                aug_min: 1,
                aug_max: 10,
            },
            chars,
            ..RandomCharConfig::default()
        }
    }

    fn fixed(count: usize) -> Selection {
        Selection {
            aug_p: 0.01,
            aug_min: count,
            aug_max: count,
        }
    }

    fn sorted_chars(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    #[tokio::test]
    async fn test_short_words_untouched() {
        let aug = RandomCharAugmenter::from_config(&RandomCharConfig::default(), Some(1));
        assert_eq!(aug.augment("a cat, an owl").await.unwrap(), "a cat, an owl");
    }

    #[tokio::test]
    async fn test_insert_adds_characters() {
        let aug = RandomCharAugmenter::new(vec![CharAction::Insert], &config(fixed(2)), Some(2));
        let out = aug.augment("elephant").await.unwrap();
        assert_eq!(out.chars().count(), 10);
    }

    #[tokio::test]
    async fn test_delete_removes_but_keeps_a_character() {
        let aug = RandomCharAugmenter::new(vec![CharAction::Delete], &config(fixed(3)), Some(3));
        let out = aug.augment("elephant, giraffe").await.unwrap();
        assert_eq!(out.chars().count(), "elephant, giraffe".chars().count() - 6);
        assert!(out.contains(", "));

        let aug = RandomCharAugmenter::new(vec![CharAction::Delete], &config(fixed(10)), Some(3));
        let out = aug.augment("word").await.unwrap();
        assert_eq!(out.chars().count(), 1);
    }

    #[tokio::test]
    async fn test_swap_keeps_letters() {
        let aug = RandomCharAugmenter::new(vec![CharAction::Swap], &config(fixed(2)), Some(4));
        let out = aug.augment("keyboard").await.unwrap();
        assert_eq!(sorted_chars(&out), sorted_chars("keyboard"));
    }

    #[tokio::test]
    async fn test_full_flow_is_reproducible() {
        let text = "Perturbing characters changes several longer words here.";
        let a = RandomCharAugmenter::from_config(&RandomCharConfig::default(), Some(9));
        let b = RandomCharAugmenter::from_config(&RandomCharConfig::default(), Some(9));
        let out = a.augment(text).await.unwrap();
        assert_eq!(out, b.augment(text).await.unwrap());
        assert!(out.ends_with('.'));
    }

    #[test]
    fn test_special_chars_join_insert_pool() {
        let cfg = RandomCharConfig {
            special_chars: "!@a".into(),
            ..RandomCharConfig::default()
        };
        let aug = RandomCharAugmenter::from_config(&cfg, None);
        assert_eq!(aug.insert_pool.len(), 62 + 2);
        assert_eq!(aug.actions.len(), 3);
    }
}
