use dashmap::DashMap;
use chrono::Utc;
use crate::data::types::AnalysisResult;

/// Latest analysis per market id. Writes for one id never touch another.
pub struct AnalysisCache {
    cache: DashMap<String, AnalysisResult>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Store content for a market, replacing any earlier result for that id
    pub fn insert(&self, market_id: &str, content: String) -> AnalysisResult {
        let result = AnalysisResult {
            market_id: market_id.to_string(),
            content,
            timestamp: Utc::now(),
        };

        self.cache.insert(market_id.to_string(), result.clone());
        result
    }

    pub fn get(&self, market_id: &str) -> Option<AnalysisResult> {
        self.cache.get(market_id).map(|entry| entry.clone())
    }

    /// Number of markets with a stored analysis
    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}
