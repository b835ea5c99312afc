//! Property tests for ranking, removal and the sequential/parallel split.

use proptest::prelude::*;
use search_core::{remove_duplicates, DocumentStatus, ExecutionPolicy, SearchServer};

const VOCABULARY: &[&str] = &["cat", "dog", "hat", "tail", "rat", "pet", "in", "on"];
const EPSILON: f64 = 1e-6;

fn document_strategy() -> impl Strategy<Value = (String, Vec<i32>, u8)> {
    (
        prop::collection::vec(prop::sample::select(VOCABULARY), 1..8),
        prop::collection::vec(-10i32..10, 0..4),
        0u8..4,
    )
        .prop_map(|(words, ratings, status)| (words.join(" "), ratings, status))
}

fn query_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::sample::select(VOCABULARY), any::<bool>()), 1..5).prop_map(
        |words| {
            words
                .into_iter()
                .map(|(word, minus)| if minus { format!("-{word}") } else { word.to_string() })
                .collect::<Vec<_>>()
                .join(" ")
        },
    )
}

fn status_of(code: u8) -> DocumentStatus {
    match code {
        0 => DocumentStatus::Actual,
        1 => DocumentStatus::Irrelevant,
        2 => DocumentStatus::Banned,
        _ => DocumentStatus::Removed,
    }
}

fn build(documents: &[(String, Vec<i32>, u8)]) -> SearchServer {
    let mut server = SearchServer::new("in on").unwrap();
    for (id, (text, ratings, status)) in documents.iter().enumerate() {
        server.add_document(id as i32, text, status_of(*status), ratings).unwrap();
    }
    server
}

proptest! {
    #[test]
    fn prop_sequential_and_parallel_agree(
        documents in prop::collection::vec(document_strategy(), 1..30),
        query in query_strategy(),
    ) {
        let server = build(&documents);
        let sequential = server.find_top_documents_with(ExecutionPolicy::Sequential, &query, |_, _, _| true).unwrap();
        let parallel = server.find_top_documents_with(ExecutionPolicy::Parallel, &query, |_, _, _| true).unwrap();
        prop_assert_eq!(sequential.len(), parallel.len());
        for (lhs, rhs) in sequential.iter().zip(&parallel) {
            prop_assert_eq!(lhs.id, rhs.id);
            prop_assert!((lhs.relevance - rhs.relevance).abs() < EPSILON);
        }
    }

    #[test]
    fn prop_results_are_ranked_and_capped(
        documents in prop::collection::vec(document_strategy(), 1..30),
        query in query_strategy(),
    ) {
        let server = build(&documents);
        let found = server.find_top_documents_by(&query, |_, _, _| true).unwrap();
        prop_assert!(found.len() <= 5);
        for pair in found.windows(2) {
            prop_assert!(pair[0].relevance + EPSILON >= pair[1].relevance);
        }
    }

    #[test]
    fn prop_minus_words_always_exclude(
        documents in prop::collection::vec(document_strategy(), 1..30),
        query in query_strategy(),
    ) {
        let server = build(&documents);
        let minus: Vec<&str> = query.split(' ').filter_map(|word| word.strip_prefix('-')).collect();
        let found = server.find_top_documents_by(&query, |_, _, _| true).unwrap();
        for document in &found {
            let words = server.word_frequencies(document.id);
            prop_assert!(minus.iter().all(|word| !words.contains_key(*word)));
        }
    }

    #[test]
    fn prop_removal_leaves_no_trace(
        documents in prop::collection::vec(document_strategy(), 1..20),
        victim in 0usize..20,
        parallel in any::<bool>(),
    ) {
        let mut server = build(&documents);
        let victim = (victim % documents.len()) as i32;
        let policy = if parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential };
        server.remove_document_with(policy, victim);
        server.remove_document_with(policy, victim);

        prop_assert_eq!(server.document_count(), documents.len() - 1);
        prop_assert!(server.word_frequencies(victim).is_empty());
        prop_assert!(server.document_ids().all(|id| id != victim));
        for word in VOCABULARY {
            let found = server.find_top_documents_by(word, |_, _, _| true).unwrap();
            prop_assert!(found.iter().all(|document| document.id != victim));
        }
    }

    #[test]
    fn prop_duplicates_keep_one_per_word_set(
        documents in prop::collection::vec(document_strategy(), 1..30),
    ) {
        let mut server = build(&documents);
        let removed = remove_duplicates(&mut server);
        prop_assert_eq!(server.document_count() + removed.len(), documents.len());

        let mut word_sets: Vec<Vec<String>> = server
            .document_ids()
            .map(|id| server.word_frequencies(id).keys().map(|term| term.to_string()).collect())
            .collect();
        let before = word_sets.len();
        word_sets.sort();
        word_sets.dedup();
        prop_assert_eq!(word_sets.len(), before);
    }
}
