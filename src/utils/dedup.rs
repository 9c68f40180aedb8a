//! Deduplication of documents across sources.

use std::collections::HashSet;

use crate::models::DocumentRecord;

/// Remove documents whose URL was already seen
///
/// The URL is the identity key: the first record in iteration order wins and
/// every later record with the same URL is dropped, whatever its other
/// fields hold. Relative order of the survivors is preserved.
pub fn deduplicate_by_url(documents: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(documents.len());

    documents
        .into_iter()
        .filter(|doc| seen.insert(doc.url.clone()))
        .collect()
}

/// Find groups of indices that share a URL
///
/// Each group lists the indices in order; the first index is the record
/// [`deduplicate_by_url`] would keep. Groups of one are not reported.
pub fn find_duplicates(documents: &[DocumentRecord]) -> Vec<Vec<usize>> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    for (idx, doc) in documents.iter().enumerate() {
        match groups.iter_mut().find(|(url, _)| *url == doc.url) {
            Some((_, group)) => group.push(idx),
            None => groups.push((doc.url.clone(), vec![idx])),
        }
    }

    groups
        .into_iter()
        .map(|(_, group)| group)
        .filter(|group| group.len() > 1)
        .collect()
}
