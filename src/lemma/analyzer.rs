//! Morphological lemma analyzer
//!
//! Turns free text into normalized Russian word roots. The tokenizer splits
//! on whitespace, ASCII punctuation, the em-dash and the copyright sign;
//! each surviving token is lowercased, "ё" is folded to "е", function words
//! are discarded, and the remainder is reduced to its normal form with the
//! Snowball Russian stemmer. Tokens the analyzer cannot parse (anything with
//! a non-Cyrillic character) are skipped and never abort processing.
//!
//! All offsets produced by this module are character offsets, not byte
//! offsets, so snippet windows measured "in characters" mean what they say.

use crate::lemma::stopwords::is_function_word;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

/// A single occurrence of a searched lemma inside a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaHit {
    /// Character offset of the first character of the matched word
    pub start: usize,

    /// Character offset one past the last character of the matched word
    pub end: usize,

    /// The normal form that matched
    pub lemma: String,
}

/// Stateless analyzer: text in, lemma counts (or lemma occurrences) out
pub struct LemmaAnalyzer {
    stemmer: Stemmer,
}

impl LemmaAnalyzer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }

    /// Splits the text into significant lemmas and counts each of them
    ///
    /// Function words (interjections, conjunctions, prepositions, particles,
    /// pronouns) are discarded entirely. Counts are keyed on the "ё"-folded
    /// normal form, so visually identical lemmas merge.
    pub fn analyze(&self, text: &str) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for token in tokenize(text) {
            let word = fold(token.word);
            if !is_russian_word(&word) {
                tracing::debug!("Skipping unparseable token: {}", token.word);
                continue;
            }
            if is_function_word(&word) {
                continue;
            }
            let lemma = self.stemmer.stem(&word).to_string();
            *counts.entry(lemma).or_insert(0) += 1;
        }
        counts
    }

    /// Locates occurrences of the given lemma set in the text, word by word
    ///
    /// Scanning is unbounded until the first match; after that only tokens
    /// starting within `max_depth` characters of the first match are
    /// considered. This bounds snippet construction cost on long pages.
    /// Hits are reported in text order with character offsets.
    pub fn find_occurrences(&self, text: &str, lemmas: &[String], max_depth: usize) -> Vec<LemmaHit> {
        let mut hits: Vec<LemmaHit> = Vec::new();
        let mut scan_limit = usize::MAX;
        for token in tokenize(text) {
            if token.start > scan_limit {
                break;
            }
            let word = fold(token.word);
            if !is_russian_word(&word) {
                continue;
            }
            let lemma = self.stemmer.stem(&word).to_string();
            if lemmas.iter().any(|l| *l == lemma) {
                if hits.is_empty() {
                    scan_limit = token.start + max_depth;
                }
                hits.push(LemmaHit {
                    start: token.start,
                    end: token.end,
                    lemma,
                });
            }
        }
        hits
    }

    /// Reduces a single lowercase word to its normal form, or `None` for
    /// function words and unparseable tokens
    pub fn normal_form(&self, word: &str) -> Option<String> {
        let word = fold(word);
        if !is_russian_word(&word) || is_function_word(&word) {
            return None;
        }
        Some(self.stemmer.stem(&word).to_string())
    }
}

impl Default for LemmaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-boundary characters: whitespace, ASCII punctuation, em-dash, ©
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation() || c == '—' || c == '©'
}

fn fold(word: &str) -> String {
    word.to_lowercase().replace('ё', "е")
}

/// A word is parseable only when it is entirely Cyrillic
fn is_russian_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| ('а'..='я').contains(&c))
}

struct Token<'a> {
    /// Character offset of the token start
    start: usize,

    /// Character offset one past the token end
    end: usize,

    word: &'a str,
}

/// Splits text into tokens with character offsets, dropping empty runs
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut run_start: Option<(usize, usize)> = None; // (char idx, byte idx)
    let mut char_idx = 0;
    for (byte_idx, c) in text.char_indices() {
        if is_separator(c) {
            if let Some((start_char, start_byte)) = run_start.take() {
                tokens.push(Token {
                    start: start_char,
                    end: char_idx,
                    word: &text[start_byte..byte_idx],
                });
            }
        } else if run_start.is_none() {
            run_start = Some((char_idx, byte_idx));
        }
        char_idx += 1;
    }
    if let Some((start_char, start_byte)) = run_start {
        tokens.push(Token {
            start: start_char,
            end: char_idx,
            word: &text[start_byte..],
        });
    }
    tokens
}
