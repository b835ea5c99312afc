use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Tunables for ranking and request statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on the number of documents a ranking returns.
    pub max_result_count: usize,
    /// Relevance values closer than this are ranked by rating instead.
    pub relevance_epsilon: f64,
    /// Shard count of the aggregation map used by parallel ranking.
    pub concurrent_buckets: usize,
    /// Number of most recent requests tracked by `RequestQueue`.
    pub request_window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_result_count: 5,
            relevance_epsilon: 1e-6,
            concurrent_buckets: 100,
            request_window: 1440,
        }
    }
}

impl SearchConfig {
    /// Parse a config from JSON; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.concurrent_buckets = self.concurrent_buckets.max(1);
        self
    }
}
