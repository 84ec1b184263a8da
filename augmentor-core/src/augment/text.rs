//! Word spans, selection counts and casing helpers shared by the augmenters.

use crate::config::Selection;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*").expect("word pattern is valid")
});

static STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Byte ranges of every word in `text`, in order.
pub fn word_spans(text: &str) -> Vec<Range<usize>> {
    WORD.find_iter(text).map(|m| m.range()).collect()
}

pub fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.binary_search(&lower.as_str()).is_ok()
}

/// Number of items to augment out of `candidates`.
pub fn aug_count(candidates: usize, selection: &Selection) -> usize {
    if candidates == 0 {
        return 0;
    }
    let wanted = (selection.aug_p * candidates as f64).ceil() as usize;
    wanted
        .max(selection.aug_min)
        .min(selection.aug_max)
        .min(candidates)
}

/// Pick `count` distinct entries of `pool` at random, returned in pool order.
pub fn pick_ordered<T: Copy + Ord>(rng: &mut StdRng, pool: &[T], count: usize) -> Vec<T> {
    let mut picked: Vec<T> = pool.choose_multiple(rng, count).copied().collect();
    picked.sort_unstable();
    picked
}

/// A seeded generator when `seed` is set, otherwise one seeded from the OS.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Give `replacement` the casing pattern of `original`.
pub fn match_case(original: &str, replacement: &str) -> String {
    let mut letters = original.chars().filter(|c| c.is_alphabetic());
    let first_upper = letters.next().is_some_and(char::is_uppercase);
    let rest_upper = original
        .chars()
        .filter(|c| c.is_alphabetic())
        .skip(1)
        .all(char::is_uppercase);
    let multi = original.chars().filter(|c| c.is_alphabetic()).count() > 1;

    if first_upper && rest_upper && multi {
        return replacement.to_uppercase();
    }
    if first_upper {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    replacement.to_string()
}

/// Replace byte ranges of `text`; ranges must be sorted and disjoint.
pub fn splice(text: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in replacements {
        out.push_str(&text[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
        assert!(is_stopword("The"));
        assert!(!is_stopword("cat"));
    }

    #[test]
    fn test_word_spans_skip_punctuation() {
        let text = "The cat's hat, isn't it?";
        let words: Vec<&str> = word_spans(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(words, vec!["The", "cat's", "hat", "isn't", "it"]);
    }

    #[test]
    fn test_aug_count_clamps() {
        let sel = Selection::default();
        assert_eq!(aug_count(0, &sel), 0);
        assert_eq!(aug_count(1, &sel), 1);
        assert_eq!(aug_count(10, &sel), 3);
        assert_eq!(aug_count(100, &sel), 10);

        let sel = Selection {
            aug_p: 0.1,
            aug_min: 4,
            aug_max: 10,
        };
        assert_eq!(aug_count(2, &sel), 2);
        assert_eq!(aug_count(10, &sel), 4);
    }

    #[test]
    fn test_match_case() {
        assert_eq!(match_case("Big", "large"), "Large");
        assert_eq!(match_case("NASA", "agency"), "AGENCY");
        assert_eq!(match_case("big", "Large"), "Large");
        assert_eq!(match_case("A", "one"), "One");
    }

    #[test]
    fn test_splice_keeps_surroundings() {
        let text = "big dog, small cat.";
        let out = splice(text, &[(0..3, "large".into()), (9..14, "tiny".into())]);
        assert_eq!(out, "large dog, tiny cat.");
    }

    #[test]
    fn test_pick_ordered_is_sorted_and_distinct() {
        let mut rng = make_rng(Some(1));
        let pool: Vec<usize> = (0..20).collect();
        let picked = pick_ordered(&mut rng, &pool, 5);
        assert_eq!(picked.len(), 5);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }
}
