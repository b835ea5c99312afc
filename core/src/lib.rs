//! In-memory TF-IDF search over short text documents.
//!
//! [`SearchServer`] owns the inverted index. Queries are space separated words;
//! a leading `-` marks a word that must not appear in a result. Ranking has a
//! sequential and a rayon-backed variant selected with [`ExecutionPolicy`].

pub mod concurrent_map;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod paginator;
pub mod process_queries;
pub mod query;
pub mod remove_duplicates;
pub mod request_queue;
pub mod tokenizer;

pub use concurrent_map::ConcurrentMap;
pub use config::SearchConfig;
pub use document::{Document, DocumentId, DocumentStatus, ExecutionPolicy};
pub use error::{ErrorKind, Result, SearchError};
pub use index::{compute_average_rating, SearchServer, Term};
pub use paginator::{paginate, Page, Paginator};
pub use process_queries::{process_queries, process_queries_joined};
pub use query::Query;
pub use remove_duplicates::remove_duplicates;
pub use request_queue::RequestQueue;
pub use tokenizer::{is_valid_word, split_into_words, StopWords};
