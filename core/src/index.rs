use crate::concurrent_map::ConcurrentMap;
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};
use crate::{Document, DocumentId, DocumentStatus, ExecutionPolicy};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::iter::Copied;
use std::sync::Arc;

/// An indexed word. Forward and reverse maps share one allocation per distinct word.
pub type Term = Arc<str>;

/// Documents containing one term, with the term's frequency in each. Locked per term so
/// a parallel removal can erase from several buckets at once.
type Postings = RwLock<BTreeMap<DocumentId, f64>>;

static EMPTY_FREQUENCIES: BTreeMap<Term, f64> = BTreeMap::new();

#[derive(Debug, Clone, Copy)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
}

/// In-memory inverted index ranking documents by TF-IDF.
#[derive(Debug, Default)]
pub struct SearchServer {
    config: SearchConfig,
    stop_words: StopWords,
    word_to_document_freqs: BTreeMap<Term, Postings>,
    document_to_word_freqs: BTreeMap<DocumentId, BTreeMap<Term, f64>>,
    documents: BTreeMap<DocumentId, DocumentData>,
    document_ids: BTreeSet<DocumentId>,
}

impl SearchServer {
    /// Creates a server whose stop words are the space separated words of `stop_words_text`.
    pub fn new(stop_words_text: &str) -> Result<Self> {
        Ok(Self::with_config(StopWords::parse(stop_words_text)?, SearchConfig::default()))
    }

    pub fn from_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_config(StopWords::from_words(stop_words)?, SearchConfig::default()))
    }

    pub fn with_config(stop_words: StopWords, config: SearchConfig) -> Self {
        Self { config: config.normalized(), stop_words, ..Self::default() }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn add_document(
        &mut self,
        document_id: DocumentId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 {
            return Err(SearchError::InvalidDocumentId(document_id));
        }
        if self.documents.contains_key(&document_id) {
            return Err(SearchError::DuplicateDocumentId(document_id));
        }
        let words = self.split_into_words_no_stop(document)?;

        let mut frequencies: BTreeMap<&str, f64> = BTreeMap::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for &word in &words {
                *frequencies.entry(word).or_insert(0.0) += inv_word_count;
            }
        }

        let mut word_freqs = BTreeMap::new();
        for (word, freq) in frequencies {
            let term = self.intern(word);
            self.word_to_document_freqs
                .entry(Arc::clone(&term))
                .or_default()
                .get_mut()
                .insert(document_id, freq);
            word_freqs.insert(term, freq);
        }

        tracing::debug!(document_id, terms = word_freqs.len(), "indexed document");
        self.document_to_word_freqs.insert(document_id, word_freqs);
        self.documents.insert(
            document_id,
            DocumentData { rating: compute_average_rating(ratings), status },
        );
        self.document_ids.insert(document_id);
        Ok(())
    }

    pub fn remove_document(&mut self, document_id: DocumentId) {
        self.remove_document_with(ExecutionPolicy::Sequential, document_id);
    }

    /// Removes a document; unknown ids are ignored. The parallel policy erases the
    /// document from each of its term buckets on the rayon pool.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, document_id: DocumentId) {
        let Some(word_freqs) = self.document_to_word_freqs.remove(&document_id) else {
            return;
        };

        self.erase_postings(policy, document_id, &word_freqs);

        for term in word_freqs.keys() {
            let emptied = self
                .word_to_document_freqs
                .get_mut(term)
                .is_some_and(|postings| postings.get_mut().is_empty());
            if emptied {
                self.word_to_document_freqs.remove(term);
            }
        }
        self.documents.remove(&document_id);
        self.document_ids.remove(&document_id);
        tracing::debug!(document_id, ?policy, "removed document");
    }

    /// Top documents with status [`DocumentStatus::Actual`].
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by_status_with(ExecutionPolicy::Sequential, raw_query, status)
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let query = Query::parse(raw_query, &self.stop_words, true)?;
        let matched = self.find_all_documents(&query, &predicate);
        Ok(self.top(ExecutionPolicy::Sequential, matched))
    }

    pub fn find_top_documents_by_status_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_with(policy, raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Ranks documents accepted by `predicate` against `raw_query`.
    ///
    /// Relevance is the sum of TF-IDF over the query's plus words. Documents
    /// containing any minus word are dropped. Results are ordered by relevance,
    /// near-equal relevance (within `relevance_epsilon`) by rating, and cut to
    /// `max_result_count`.
    pub fn find_top_documents_with<P>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        if policy == ExecutionPolicy::Sequential {
            return self.find_top_documents_by(raw_query, predicate);
        }
        let query = Query::parse(raw_query, &self.stop_words, true)?;
        let matched = self.find_all_documents_par(&query, &predicate);
        Ok(self.top(policy, matched))
    }

    pub fn match_document(
        &self,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    /// Plus words of `raw_query` found in the document, sorted and unique. Empty when
    /// the document contains a minus word.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        let query = Query::parse(raw_query, &self.stop_words, policy == ExecutionPolicy::Sequential)?;
        let status = self
            .documents
            .get(&document_id)
            .ok_or(SearchError::DocumentNotFound(document_id))?
            .status;
        let word_freqs = self.word_frequencies(document_id);

        let matched: Vec<&str> = match policy {
            ExecutionPolicy::Sequential => {
                if query.minus_words.iter().any(|word| word_freqs.contains_key(*word)) {
                    return Ok((Vec::new(), status));
                }
                query
                    .plus_words
                    .iter()
                    .filter_map(|word| document_term(word_freqs, word))
                    .collect()
            }
            ExecutionPolicy::Parallel => {
                if query.minus_words.par_iter().any(|word| word_freqs.contains_key(*word)) {
                    return Ok((Vec::new(), status));
                }
                let mut matched: Vec<&str> = query
                    .plus_words
                    .par_iter()
                    .filter_map(|word| document_term(word_freqs, word))
                    .collect();
                matched.par_sort_unstable();
                matched.dedup();
                matched
            }
        };
        Ok((matched, status))
    }

    /// Term frequencies of a document, or an empty map for unknown ids.
    pub fn word_frequencies(&self, document_id: DocumentId) -> &BTreeMap<Term, f64> {
        self.document_to_word_freqs.get(&document_id).unwrap_or(&EMPTY_FREQUENCIES)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document_status(&self, document_id: DocumentId) -> Option<DocumentStatus> {
        self.documents.get(&document_id).map(|data| data.status)
    }

    pub fn document_rating(&self, document_id: DocumentId) -> Option<i32> {
        self.documents.get(&document_id).map(|data| data.rating)
    }

    /// Indexed document ids in ascending order.
    pub fn document_ids(&self) -> Copied<btree_set::Iter<'_, DocumentId>> {
        self.document_ids.iter().copied()
    }

    /// Erases `document_id` from the postings of each term in `word_freqs` and returns
    /// how many postings were visited. Only the document's own terms are looked up.
    fn erase_postings(
        &mut self,
        policy: ExecutionPolicy,
        document_id: DocumentId,
        word_freqs: &BTreeMap<Term, f64>,
    ) -> usize {
        match policy {
            ExecutionPolicy::Sequential => {
                let mut visited = 0;
                for term in word_freqs.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(term) {
                        postings.get_mut().remove(&document_id);
                        visited += 1;
                    }
                }
                visited
            }
            ExecutionPolicy::Parallel => {
                let forward = &self.word_to_document_freqs;
                word_freqs
                    .par_iter()
                    .map(|(term, _)| match forward.get(term) {
                        Some(postings) => {
                            postings.write().remove(&document_id);
                            1
                        }
                        None => 0,
                    })
                    .sum()
            }
        }
    }

    fn top(&self, policy: ExecutionPolicy, mut matched: Vec<Document>) -> Vec<Document> {
        self.rank(policy, &mut matched);
        matched.truncate(self.config.max_result_count);
        matched
    }

    fn intern(&self, word: &str) -> Term {
        match self.word_to_document_freqs.get_key_value(word) {
            Some((term, _)) => Arc::clone(term),
            None => Arc::from(word),
        }
    }

    fn split_into_words_no_stop<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    // Only called for terms with at least one document.
    fn inverse_document_freq(&self, documents_with_term: usize) -> f64 {
        (self.document_count() as f64 / documents_with_term as f64).ln()
    }

    fn find_all_documents<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.word_to_document_freqs.get(*word) else {
                continue;
            };
            let documents = postings.read();
            let idf = self.inverse_document_freq(documents.len());
            for (&document_id, &term_freq) in documents.iter() {
                if self.accepts(document_id, predicate) {
                    *document_to_relevance.entry(document_id).or_insert(0.0) += term_freq * idf;
                }
            }
        }

        for word in &query.minus_words {
            if let Some(postings) = self.word_to_document_freqs.get(*word) {
                for document_id in postings.read().keys() {
                    document_to_relevance.remove(document_id);
                }
            }
        }

        self.into_documents(document_to_relevance)
    }

    fn find_all_documents_par<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance: ConcurrentMap<DocumentId, f64> =
            ConcurrentMap::new(self.config.concurrent_buckets);

        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.word_to_document_freqs.get(*word) else {
                return;
            };
            let documents = postings.read();
            let idf = self.inverse_document_freq(documents.len());
            for (&document_id, &term_freq) in documents.iter() {
                if self.accepts(document_id, predicate) {
                    document_to_relevance.update(document_id, |relevance| {
                        *relevance += term_freq * idf;
                    });
                }
            }
        });

        query.minus_words.par_iter().for_each(|word| {
            if let Some(postings) = self.word_to_document_freqs.get(*word) {
                for document_id in postings.read().keys() {
                    document_to_relevance.erase(document_id);
                }
            }
        });

        self.into_documents(document_to_relevance.build_ordinary_map())
    }

    fn accepts<P>(&self, document_id: DocumentId, predicate: &P) -> bool
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        self.documents
            .get(&document_id)
            .is_some_and(|data| predicate(document_id, data.status, data.rating))
    }

    fn into_documents(&self, document_to_relevance: BTreeMap<DocumentId, f64>) -> Vec<Document> {
        document_to_relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.documents.get(&id).map(|data| Document::new(id, relevance, data.rating))
            })
            .collect()
    }

    /// Orders by relevance, then groups runs whose relevance is within epsilon of the
    /// run's first entry and orders each run by rating (id breaks exact ties).
    fn rank(&self, policy: ExecutionPolicy, documents: &mut [Document]) {
        let by_relevance = |lhs: &Document, rhs: &Document| rhs.relevance.total_cmp(&lhs.relevance);
        match policy {
            ExecutionPolicy::Sequential => documents.sort_by(by_relevance),
            ExecutionPolicy::Parallel => documents.par_sort_by(by_relevance),
        }

        let epsilon = self.config.relevance_epsilon;
        let mut start = 0;
        while start < documents.len() {
            let leader = documents[start].relevance;
            let run = documents[start..]
                .iter()
                .take_while(|document| leader - document.relevance < epsilon)
                .count()
                .max(1);
            documents[start..start + run]
                .sort_by(|lhs, rhs| rhs.rating.cmp(&lhs.rating).then(lhs.id.cmp(&rhs.id)));
            start += run;
        }
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocumentId;
    type IntoIter = Copied<btree_set::Iter<'a, DocumentId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.document_ids()
    }
}

fn document_term<'a>(word_freqs: &'a BTreeMap<Term, f64>, word: &str) -> Option<&'a str> {
    word_freqs.get_key_value(word).map(|(term, _)| &**term)
}

/// Integer mean of `ratings`, truncated toward zero; 0 for an empty slice.
pub fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&rating| i64::from(rating)).sum();
    (sum / ratings.len() as i64) as i32
}
