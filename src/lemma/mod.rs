//! Lemma analysis: tokenizing, function-word filtering and normalization

mod analyzer;
mod stopwords;

pub use analyzer::{LemmaAnalyzer, LemmaHit};
pub use stopwords::is_function_word;
