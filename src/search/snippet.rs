//! Snippet construction around the first query match
//!
//! Windows are measured in characters. The window opens at a sentence
//! boundary when one is found within a quarter of the snippet length before
//! the first match, matched words are wrapped in `<b>` tags, and truncated
//! edges get "..." affixes.

use crate::lemma::LemmaAnalyzer;

/// Snippet window length in characters
pub const MAX_SNIPPET_LENGTH: usize = 240;

/// Builds the highlighted snippet for one page
///
/// # Arguments
///
/// * `analyzer` - Analyzer used to locate query lemmas in the text
/// * `text` - Visible page text with whitespace collapsed
/// * `lemmas` - Normal forms of the query words
pub fn build_snippet(analyzer: &LemmaAnalyzer, text: &str, lemmas: &[String]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let hits = analyzer.find_occurrences(text, lemmas, MAX_SNIPPET_LENGTH);

    if hits.is_empty() {
        let end = chars.len().min(MAX_SNIPPET_LENGTH);
        let mut snippet: String = chars[..end].iter().collect();
        if end < chars.len() {
            snippet.push_str("...");
        }
        return snippet;
    }

    let first = hits[0].start;
    let floor = first.saturating_sub(MAX_SNIPPET_LENGTH / 4);
    let mut start = floor;
    for i in (floor..first).rev() {
        if chars[i] == '.' {
            start = i + 1;
            break;
        }
    }
    while start < first && chars[start].is_whitespace() {
        start += 1;
    }
    let end = chars.len().min(start + MAX_SNIPPET_LENGTH);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    let mut cursor = start;
    for hit in &hits {
        if hit.start < cursor || hit.start >= end {
            continue;
        }
        let hit_end = hit.end.min(end);
        snippet.extend(&chars[cursor..hit.start]);
        snippet.push_str("<b>");
        snippet.extend(&chars[hit.start..hit_end]);
        snippet.push_str("</b>");
        cursor = hit_end;
    }
    snippet.extend(&chars[cursor..end]);
    if end < chars.len() {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> LemmaAnalyzer {
        LemmaAnalyzer::new()
    }

    fn lemmas_of(query: &str) -> Vec<String> {
        analyzer().analyze(query).into_keys().collect()
    }

    #[test]
    fn test_snippet_wraps_match_in_bold() {
        let text = "Старый район у моря давно опустел";
        let snippet = build_snippet(&analyzer(), text, &lemmas_of("район"));
        assert!(snippet.contains("<b>район</b>"), "snippet: {}", snippet);
    }

    #[test]
    fn test_snippet_wraps_inflected_forms() {
        let text = "Гуляли по районам всю ночь";
        let snippet = build_snippet(&analyzer(), text, &lemmas_of("район"));
        assert!(snippet.contains("<b>районам</b>"), "snippet: {}", snippet);
    }

    #[test]
    fn test_snippet_without_match_is_text_prefix() {
        let text = "Короткий текст без совпадений";
        let snippet = build_snippet(&analyzer(), text, &lemmas_of("корабль"));
        assert_eq!(snippet, text);
    }

    #[test]
    fn test_long_text_without_match_gets_suffix() {
        let word = "слово ";
        let text = word.repeat(100);
        let snippet = build_snippet(&analyzer(), &text, &lemmas_of("корабль"));
        assert!(snippet.ends_with("..."));
        // 240 window chars plus the three-dot suffix
        assert_eq!(snippet.chars().count(), MAX_SNIPPET_LENGTH + 3);
    }

    #[test]
    fn test_snippet_starts_after_sentence_boundary() {
        let text = format!("{}. Здесь начинается море и пляж", "вступление ".repeat(10));
        let snippet = build_snippet(&analyzer(), &text, &lemmas_of("море"));
        assert!(snippet.starts_with("...Здесь"), "snippet: {}", snippet);
        assert!(snippet.contains("<b>море</b>"));
    }

    #[test]
    fn test_snippet_truncated_on_both_sides() {
        let filler = "наполнитель ".repeat(40);
        let text = format!("{}море{}", filler, filler);
        let snippet = build_snippet(&analyzer(), &text, &lemmas_of("море"));
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.contains("<b>море</b>"));
    }

    #[test]
    fn test_snippet_highlights_multiple_hits_in_window() {
        let text = "Море зовет, и море шумит всегда";
        let snippet = build_snippet(&analyzer(), text, &lemmas_of("море"));
        assert_eq!(snippet.matches("<b>").count(), 2);
    }

    #[test]
    fn test_snippet_counts_cyrillic_in_characters() {
        // 300 Cyrillic characters of filler after the match must be cut at
        // the character window, not at a byte boundary
        let text = format!("море {}", "ж".repeat(300));
        let snippet = build_snippet(&analyzer(), &text, &lemmas_of("море"));
        assert!(snippet.ends_with("..."));
        let visible = snippet.trim_end_matches("...");
        let plain: String = visible.replace("<b>", "").replace("</b>", "");
        assert_eq!(plain.chars().count(), MAX_SNIPPET_LENGTH);
    }

    #[test]
    fn test_empty_text_gives_empty_snippet() {
        let snippet = build_snippet(&analyzer(), "", &lemmas_of("море"));
        assert_eq!(snippet, "");
    }
}
