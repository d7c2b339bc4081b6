//! Lemma search over the inverted index

mod engine;
mod snippet;

pub use engine::{SearchEngine, SearchError, SearchResults};
pub use snippet::{build_snippet, MAX_SNIPPET_LENGTH};
