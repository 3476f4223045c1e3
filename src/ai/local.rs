use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use crate::ai::{AnalysisBackend, AnalysisError};
use crate::data::types::Market;
use crate::strategies::signal_rules;
use tracing::debug;

/// Deterministic rule-based analyst with a fixed artificial latency
pub struct LocalAnalyzer {
    latency: Duration,
}

impl LocalAnalyzer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl AnalysisBackend for LocalAnalyzer {
    fn name(&self) -> &'static str {
        "local"
    }

    fn analyze<'a>(&'a self, market: &'a Market) -> BoxFuture<'a, Result<String, AnalysisError>> {
        async move {
            tokio::time::sleep(self.latency).await;

            let report = signal_rules::evaluate(market);
            debug!(
                "Local analysis for {}: {} ({} confidence)",
                market.id, report.signal, report.confidence
            );
            Ok(signal_rules::render(market, &report))
        }
        .boxed()
    }
}
