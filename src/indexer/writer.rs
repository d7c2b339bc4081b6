//! Page persistence: one page row plus its lemma and index rows
//!
//! Lemma analysis runs before the storage lock is taken; the whole row
//! sequence then goes in under a single lock so concurrent page writers
//! never interleave frequency updates.

use crate::crawler::{extract_text, FetchOutcome, SiteCrawl};
use crate::storage::{SqliteStorage, Storage, StorageResult};
use std::collections::{HashMap, HashSet};

/// Persists one fetched page for the given crawl
///
/// Successful responses get their visible text analyzed into lemma counts;
/// failed fetches are stored as a bare page row. A storage error aborts the
/// owning site's crawl through [`SiteCrawl::fail`].
pub fn write_page(crawl: &SiteCrawl, path: &str, outcome: &FetchOutcome) {
    let counts = if outcome.is_success() {
        crawl.analyzer.analyze(&extract_text(&outcome.body))
    } else {
        HashMap::new()
    };

    let mut storage = crawl.storage.lock().unwrap();
    if crawl.is_cancelled() {
        return;
    }
    if let Err(e) = persist(&mut storage, crawl.site_id, path, outcome, &counts) {
        crawl.fail(format!("Failed to save page {}: {}", path, e));
    }
}

/// Writes the page row, bumps existing lemma frequencies, inserts new
/// lemmas at frequency 1 and batch-inserts the index postings
fn persist(
    storage: &mut SqliteStorage,
    site_id: i64,
    path: &str,
    outcome: &FetchOutcome,
    counts: &HashMap<String, u32>,
) -> StorageResult<()> {
    let page_id = storage.create_page(site_id, path, outcome.code, &outcome.body)?;
    if counts.is_empty() {
        return Ok(());
    }

    let names: Vec<String> = counts.keys().cloned().collect();
    // -1 picks up rows a single-page re-index has decremented to zero
    let existing = storage.find_lemmas_by_site_and_set(site_id, &names, -1)?;
    let existing_ids: Vec<i64> = existing.iter().map(|l| l.id).collect();
    storage.increment_lemma_frequency(&existing_ids)?;

    let known: HashSet<&str> = existing.iter().map(|l| l.lemma.as_str()).collect();
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !known.contains(name.as_str()))
        .cloned()
        .collect();
    let created = storage.create_lemmas(site_id, &missing)?;

    let mut lemma_ids: HashMap<&str, i64> = HashMap::with_capacity(counts.len());
    for lemma in existing.iter().chain(created.iter()) {
        lemma_ids.insert(lemma.lemma.as_str(), lemma.id);
    }

    let mut entries = Vec::with_capacity(counts.len());
    for (lemma, count) in counts {
        match lemma_ids.get(lemma.as_str()) {
            Some(id) => entries.push((page_id, *id, f64::from(*count))),
            None => tracing::warn!("No lemma row for '{}' on page {}", lemma, path),
        }
    }
    storage.create_index_entries(&entries)?;

    Ok(())
}
