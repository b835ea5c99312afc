use crate::error::Result;
use crate::{Document, DocumentId, DocumentStatus, SearchServer};
use std::collections::VecDeque;

/// Forwards searches to a [`SearchServer`] and counts how many of the most
/// recent requests came back empty.
pub struct RequestQueue<'a> {
    server: &'a SearchServer,
    requests: VecDeque<bool>,
    window: usize,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    /// Window size comes from the server's `request_window` setting.
    pub fn new(server: &'a SearchServer) -> Self {
        Self::with_window(server, server.config().request_window)
    }

    pub fn with_window(server: &'a SearchServer, window: usize) -> Self {
        Self { server, requests: VecDeque::with_capacity(window), window, no_result_requests: 0 }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        let result = self.server.find_top_documents(raw_query)?;
        Ok(self.record(result))
    }

    pub fn add_find_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        let result = self.server.find_top_documents_by_status(raw_query, status)?;
        Ok(self.record(result))
    }

    pub fn add_find_request_by<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let result = self.server.find_top_documents_by(raw_query, predicate)?;
        Ok(self.record(result))
    }

    /// Empty results among the last `window` successful requests.
    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    fn record(&mut self, result: Vec<Document>) -> Vec<Document> {
        if self.window == 0 {
            return result;
        }
        if self.requests.len() >= self.window {
            if let Some(true) = self.requests.pop_front() {
                self.no_result_requests -= 1;
            }
        }
        let is_empty = result.is_empty();
        if is_empty {
            self.no_result_requests += 1;
        }
        self.requests.push_back(is_empty);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> SearchServer {
        let mut server = SearchServer::new("and in at").unwrap();
        server.add_document(1, "curly cat curly tail", DocumentStatus::Actual, &[7, 2, 7]).unwrap();
        server.add_document(2, "curly dog and fancy collar", DocumentStatus::Actual, &[1, 2, 3]).unwrap();
        server.add_document(3, "big cat fancy collar ", DocumentStatus::Actual, &[1, 2, 8]).unwrap();
        server.add_document(4, "big dog sparrow Eugene", DocumentStatus::Actual, &[1, 3, 2]).unwrap();
        server.add_document(5, "big dog sparrow Vasiliy", DocumentStatus::Actual, &[1, 1, 1]).unwrap();
        server
    }

    #[test]
    fn window_keeps_only_recent_requests() {
        let server = server();
        let mut queue = RequestQueue::new(&server);
        for _ in 0..1439 {
            queue.add_find_request("empty request").unwrap();
        }
        queue.add_find_request("curly dog").unwrap();
        queue.add_find_request("big collar").unwrap();
        queue.add_find_request("sparrow").unwrap();
        assert_eq!(queue.no_result_requests(), 1437);
    }

    #[test]
    fn failed_requests_are_not_recorded() {
        let server = server();
        let mut queue = RequestQueue::with_window(&server, 2);
        assert!(queue.add_find_request("--bad").is_err());
        assert_eq!(queue.no_result_requests(), 0);
        queue.add_find_request_by_status("cat", DocumentStatus::Banned).unwrap();
        queue.add_find_request_by("cat", |id, _, _| id % 2 == 1).unwrap();
        assert_eq!(queue.no_result_requests(), 1);
    }

    #[test]
    fn zero_window_counts_nothing() {
        let server = server();
        let mut queue = RequestQueue::with_window(&server, 0);
        queue.add_find_request("nothing here").unwrap();
        assert_eq!(queue.no_result_requests(), 0);
    }

    #[test]
    fn predicate_may_hold_local_state() {
        let server = server();
        let mut queue = RequestQueue::with_window(&server, 4);
        let seen = std::cell::RefCell::new(Vec::new());
        let found = queue
            .add_find_request_by("sparrow", |id, _, _| {
                seen.borrow_mut().push(id);
                id == 4
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 4);
        assert_eq!(seen.into_inner(), vec![4, 5]);
        assert_eq!(queue.no_result_requests(), 0);
    }
}
