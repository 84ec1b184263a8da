//! Back-translation: source language -> intermediate language -> source.

use super::{Augmenter, Technique};
use crate::error::AugmentError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A machine translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, AugmentError>;
}

/// Client for the public Google Translate web endpoint (`translate_a/single`).
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, AugmentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, AugmentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AugmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        parse_google_response(&body)
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The payload looks like `[[["Bonjour", "Hello", ...], ...], null, "en", ...]`.
pub fn parse_google_response(body: &Value) -> Result<String, AugmentError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| AugmentError::invalid_response("google-translate", "missing segments"))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(AugmentError::invalid_response(
            "google-translate",
            "empty translation",
        ));
    }
    Ok(translated)
}

/// Round-trips text through an intermediate language.
pub struct BackTranslationAugmenter {
    translator: Box<dyn Translator>,
    source_lang: String,
    intermediate_lang: String,
    max_chars: usize,
}

impl BackTranslationAugmenter {
    pub fn new(
        translator: Box<dyn Translator>,
        source_lang: &str,
        intermediate_lang: &str,
        max_chars: usize,
    ) -> Self {
        Self {
            translator,
            source_lang: source_lang.to_string(),
            intermediate_lang: intermediate_lang.to_string(),
            max_chars: max_chars.max(1),
        }
    }
}

#[async_trait]
impl Augmenter for BackTranslationAugmenter {
    fn technique(&self) -> Technique {
        Technique::BackTranslation
    }

    async fn augment(&self, text: &str) -> Result<String, AugmentError> {
        let chunks = chunk_text(text, self.max_chars);
        let mut out = String::with_capacity(text.len());
        for chunk in &chunks {
            if !chunk.text.trim().is_empty() {
                let forward = self
                    .translator
                    .translate(&chunk.text, &self.source_lang, &self.intermediate_lang)
                    .await?;
                let back = self
                    .translator
                    .translate(&forward, &self.intermediate_lang, &self.source_lang)
                    .await?;
                out.push_str(&back);
            }
            out.push_str(&chunk.separator);
        }
        if chunks.len() > 1 {
            tracing::debug!(chunks = chunks.len(), "Back-translated long text in chunks");
        }
        Ok(out)
    }
}

/// A piece of text sent to the translator, with the whitespace that
/// followed it in the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub separator: String,
}

/// Split `text` into pieces of at most `max_chars` characters, on sentence
/// boundaries where possible. Short texts come back as a single piece.
///
/// Concatenating every chunk's text and separator gives back `text`.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    if text.chars().count() <= max_chars {
        return vec![Chunk {
            text: text.to_string(),
            separator: String::new(),
        }];
    }

    let mut chunks = Vec::new();
    let body = text.trim_start();
    let lead = &text[..text.len() - body.len()];
    if !lead.is_empty() {
        chunks.push(Chunk {
            text: String::new(),
            separator: lead.to_string(),
        });
    }

    let mut current = String::new();
    let mut pending = String::new();
    for (sentence, gap) in sentences(body) {
        for (piece, sep) in split_long(sentence, gap, max_chars) {
            if !current.is_empty() {
                let joined =
                    current.chars().count() + pending.chars().count() + piece.chars().count();
                if joined > max_chars {
                    chunks.push(Chunk {
                        text: std::mem::take(&mut current),
                        separator: std::mem::take(&mut pending),
                    });
                } else {
                    current.push_str(&pending);
                }
            }
            current.push_str(piece);
            pending = sep.to_string();
        }
    }
    if !current.is_empty() {
        chunks.push(Chunk {
            text: current,
            separator: pending,
        });
    }
    chunks
}

/// Sentences of `text` (which must not start with whitespace), each paired
/// with the whitespace run that follows it.
fn sentences(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut end = rest.len();
        let mut after_terminal = false;
        for (i, c) in rest.char_indices() {
            if c.is_whitespace() && after_terminal {
                end = i;
                break;
            }
            after_terminal = matches!(c, '.' | '!' | '?');
        }
        let sentence = rest[..end].trim_end();
        let after = &rest[sentence.len()..];
        let next = after.trim_start();
        out.push((sentence, &after[..after.len() - next.len()]));
        rest = next;
    }
    out
}

/// Hard-split a sentence longer than `max_chars`, preferring whitespace.
/// Each piece carries the whitespace it was cut at; the last one carries `gap`.
fn split_long<'a>(sentence: &'a str, gap: &'a str, max_chars: usize) -> Vec<(&'a str, &'a str)> {
    let mut pieces = Vec::new();
    let mut rest = sentence;
    while let Some((limit, _)) = rest.char_indices().nth(max_chars) {
        let cut = match rest[..limit].rfind(char::is_whitespace) {
            Some(ws) if ws > 0 => ws,
            _ => limit,
        };
        let piece = rest[..cut].trim_end();
        let after = &rest[piece.len()..];
        let next = after.trim_start();
        pieces.push((piece, &after[..after.len() - next.len()]));
        rest = next;
    }
    if !rest.is_empty() {
        pieces.push((rest, gap));
    }
    pieces
}
