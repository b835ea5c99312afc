use crate::error::Result;
use crate::{Document, SearchServer};
use rayon::prelude::*;

/// Runs every query against `server` in parallel. `result[i]` answers `queries[i]`.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    tracing::debug!(queries = queries.len(), "processing query batch");
    queries
        .par_iter()
        .map(|query| server.find_top_documents(query.as_ref()))
        .collect()
}

/// Results of [`process_queries`] concatenated in query order.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?.into_iter().flatten().collect())
}
