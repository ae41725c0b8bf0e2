// 🗃️ Analysis Cache - memoize the pipeline by content hash of its inputs
// Sits at the boundary (server uploads); the pipeline itself stays pure

use crate::analysis::Analysis;
use crate::config::DashboardConfig;
use crate::error::CohortResult;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 16;

/// Content key: SHA-256 over length-prefixed inputs and the config
pub fn content_key(prior: &[u8], current: &[u8], config: &DashboardConfig) -> String {
    let mut hasher = Sha256::new();

    for part in [prior, current] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }

    // Config is plain data; its JSON form is stable for identical values
    let config_json = serde_json::to_vec(config).unwrap_or_default();
    hasher.update(&config_json);

    format!("{:x}", hasher.finalize())
}

pub struct AnalysisCache {
    capacity: usize,
    entries: HashMap<String, Arc<Analysis>>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        AnalysisCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Return the cached analysis for these bytes, computing it on a miss.
    /// Failures are not cached.
    pub fn get_or_analyze(
        &mut self,
        prior: &[u8],
        current: &[u8],
        config: &DashboardConfig,
    ) -> CohortResult<Arc<Analysis>> {
        let key = content_key(prior, current, config);

        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            tracing::debug!(key = %&key[..12], "analysis cache hit");
            return Ok(Arc::clone(hit));
        }

        self.misses += 1;
        let analysis = Arc::new(Analysis::from_csv_bytes(prior, current, config)?);

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                tracing::debug!(key = %&oldest[..12], "analysis cache eviction");
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, Arc::clone(&analysis));

        Ok(analysis)
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ============================================================================
// TESTS
// ============================================================================
