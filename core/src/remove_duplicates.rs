use crate::index::Term;
use crate::{DocumentId, SearchServer};
use std::collections::BTreeSet;

/// Removes documents whose set of distinct words equals that of a lower-id document.
/// Returns the removed ids in ascending order.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocumentId> {
    let mut seen: BTreeSet<BTreeSet<Term>> = BTreeSet::new();
    let mut duplicates = Vec::new();

    for document_id in server.document_ids() {
        let words: BTreeSet<Term> = server.word_frequencies(document_id).keys().cloned().collect();
        if seen.contains(&words) {
            tracing::info!(document_id, "Found duplicate document id {document_id}");
            duplicates.push(document_id);
        } else {
            seen.insert(words);
        }
    }

    for &document_id in &duplicates {
        server.remove_document(document_id);
    }
    duplicates
}
