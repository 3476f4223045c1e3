use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use crate::ai::{AnalysisBackend, AnalysisError};
use crate::data::cache::AnalysisCache;
use crate::data::types::{AnalysisResult, Market};
use crate::execution::simulator::MarketSimulator;
use crate::execution::types::TickReport;
use crate::monitoring::logger::TickLogger;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

struct MarketState {
    markets: Vec<Market>,
    simulator: MarketSimulator,
    selected: String,
}

/// Single owner of the market map, the selection and the analysis cache.
/// Market transitions happen under one write lock; analyses are keyed per id.
pub struct Dashboard {
    state: RwLock<MarketState>,
    analyses: AnalysisCache,
    backend: Arc<dyn AnalysisBackend>,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight counter however the request ends
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dashboard {
    /// Seed every market's history and take ownership of the set
    pub fn new(
        mut markets: Vec<Market>,
        mut simulator: MarketSimulator,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        simulator.seed_markets(&mut markets);
        let selected = markets.first().map(|m| m.id.clone()).unwrap_or_default();

        info!(
            "Dashboard initialized with {} markets, analysis backend: {}",
            markets.len(),
            backend.name()
        );

        Self {
            state: RwLock::new(MarketState {
                markets,
                simulator,
                selected,
            }),
            analyses: AnalysisCache::new(),
            backend,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub async fn markets(&self) -> Vec<Market> {
        self.state.read().await.markets.clone()
    }

    pub async fn market(&self, id: &str) -> Option<Market> {
        self.state
            .read()
            .await
            .markets
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub async fn select(&self, id: &str) -> Result<(), DashboardError> {
        let mut state = self.state.write().await;
        if !state.markets.iter().any(|m| m.id == id) {
            return Err(DashboardError::UnknownMarket(id.to_string()));
        }
        state.selected = id.to_string();
        Ok(())
    }

    /// Selected market, falling back to the first one
    pub async fn selected_market(&self) -> Option<Market> {
        let state = self.state.read().await;
        state
            .markets
            .iter()
            .find(|m| m.id == state.selected)
            .or_else(|| state.markets.first())
            .cloned()
    }

    /// Advance all markets one step, replacing the whole map atomically
    pub async fn tick(&self) -> TickReport {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        // Failed markets come back unchanged in `next`
        let (next, errors) = state.simulator.advance(&state.markets);
        state.markets = next;

        TickReport {
            tick: state.simulator.ticks(),
            updated: state.markets.len() - errors.len(),
            skipped: errors.into_iter().map(|e| e.market_id().to_string()).collect(),
            cached_analyses: self.analyses.len(),
        }
    }

    pub async fn ticks(&self) -> u64 {
        self.state.read().await.simulator.ticks()
    }

    /// Analyze the current snapshot of one market and cache the result.
    /// On failure the cache keeps whatever it held for that market.
    pub async fn request_analysis(&self, id: &str) -> Result<AnalysisResult, DashboardError> {
        let snapshot = self
            .market(id)
            .await
            .ok_or_else(|| DashboardError::UnknownMarket(id.to_string()))?;

        // Later ticks do not affect this request's snapshot
        let _guard = InFlight::start(&self.in_flight);
        match self.backend.analyze(&snapshot).await {
            Ok(content) => {
                info!("Analysis ready for {}", id);
                Ok(self.analyses.insert(id, content))
            }
            Err(e) => {
                error!("Analysis for {} failed: {}", id, e);
                Err(e.into())
            }
        }
    }

    pub fn analysis(&self, id: &str) -> Option<AnalysisResult> {
        self.analyses.get(id)
    }

    pub fn is_analyzing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

/// Simulation clock: tick every `interval` until shutdown flips to true
pub async fn run_simulation(
    dashboard: Arc<Dashboard>,
    interval: Duration,
    mut logger: TickLogger,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut clock = tokio::time::interval(interval);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First interval tick fires immediately
    clock.tick().await;

    loop {
        tokio::select! {
            _ = clock.tick() => {
                // Advance, then log from a fresh snapshot
                let report = dashboard.tick().await;
                let markets = dashboard.markets().await;
                logger.record(&report, &markets);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Simulation clock stopped after {} summaries", logger.summaries());
                    break;
                }
            }
        }
    }
}

/// Periodically analyze the selected market, then rotate the selection
pub async fn run_auto_analysis(
    dashboard: Arc<Dashboard>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut clock = tokio::time::interval(every);
    clock.tick().await;

    loop {
        tokio::select! {
            _ = clock.tick() => {
                let Some(market) = dashboard.selected_market().await else {
                    continue;
                };

                let worker = Arc::clone(&dashboard);
                let market_id = market.id.clone();
                // Requests are not cancelled; the last one to resolve wins
                tokio::spawn(async move {
                    if let Ok(result) = worker.request_analysis(&market_id).await {
                        info!("Analysis for {}:\n{}", result.market_id, result.content);
                    }
                });

                // Rotate to the next market
                let markets = dashboard.markets().await;
                if let Some(pos) = markets.iter().position(|m| m.id == market.id) {
                    let next = &markets[(pos + 1) % markets.len()];
                    let _ = dashboard.select(&next.id).await;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::local::LocalAnalyzer;
    use crate::config::{MonitoringConfig, SimulationConfig};
    use crate::data::catalog::initial_markets;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::collections::HashMap;

    /// Resolves after a per-market delay, echoing the market id
    struct DelayedEcho {
        delays: HashMap<String, Duration>,
    }

    impl AnalysisBackend for DelayedEcho {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn analyze<'a>(
            &'a self,
            market: &'a Market,
        ) -> BoxFuture<'a, Result<String, AnalysisError>> {
            async move {
                let delay = self.delays.get(&market.id).copied().unwrap_or_default();
                tokio::time::sleep(delay).await;
                Ok(format!("analysis of {} at {}", market.id, market.price))
            }
            .boxed()
        }
    }

    /// Each call sleeps for the next configured delay
    struct Countdown {
        calls: AtomicUsize,
        delays: Vec<Duration>,
    }

    impl AnalysisBackend for Countdown {
        fn name(&self) -> &'static str {
            "countdown"
        }

        fn analyze<'a>(
            &'a self,
            _market: &'a Market,
        ) -> BoxFuture<'a, Result<String, AnalysisError>> {
            async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                let delay = self.delays.get(call).copied().unwrap_or_default();
                tokio::time::sleep(delay).await;
                Ok(format!("call {}", call))
            }
            .boxed()
        }
    }

    struct AlwaysMissingKey;

    impl AnalysisBackend for AlwaysMissingKey {
        fn name(&self) -> &'static str {
            "missing-key"
        }

        fn analyze<'a>(
            &'a self,
            _market: &'a Market,
        ) -> BoxFuture<'a, Result<String, AnalysisError>> {
            async { Err(AnalysisError::MissingApiKey) }.boxed()
        }
    }

    fn dashboard(backend: Arc<dyn AnalysisBackend>) -> Dashboard {
        Dashboard::new(
            initial_markets(),
            MarketSimulator::with_seed(SimulationConfig::default(), 17),
            backend,
        )
    }

    #[tokio::test]
    async fn test_new_seeds_history_and_selects_first() {
        let dash = dashboard(Arc::new(LocalAnalyzer::new(Duration::ZERO)));

        let markets = dash.markets().await;
        assert_eq!(markets.len(), 9);
        assert!(markets.iter().all(|m| m.history.len() == 50));
        assert_eq!(dash.selected_market().await.unwrap().id, "forex-eurusd");
    }

    #[tokio::test]
    async fn test_select_rejects_unknown_market() {
        let dash = dashboard(Arc::new(LocalAnalyzer::new(Duration::ZERO)));

        dash.select("crypto-btc").await.unwrap();
        assert_eq!(dash.selected_market().await.unwrap().id, "crypto-btc");

        let err = dash.select("forex-usdjpy").await.unwrap_err();
        assert!(matches!(err, DashboardError::UnknownMarket(_)));
        assert_eq!(dash.selected_market().await.unwrap().id, "crypto-btc");
    }

    #[tokio::test]
    async fn test_tick_replaces_all_markets() {
        let dash = dashboard(Arc::new(LocalAnalyzer::new(Duration::ZERO)));
        let before = dash.markets().await;

        let report = dash.tick().await;
        assert_eq!(report.tick, 1);
        assert_eq!(report.updated, 9);
        assert!(report.skipped.is_empty());
        assert_eq!(report.cached_analyses, 0);

        let after = dash.markets().await;
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(a.previous_price, b.price);
            assert_eq!(a.history.len(), 50);
            assert_eq!(a.history.last().unwrap().price, a.price);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_analysis_caches_result() {
        let dash = dashboard(Arc::new(LocalAnalyzer::new(Duration::from_millis(1500))));
        assert!(dash.analysis("crypto-btc").is_none());

        let result = dash.request_analysis("crypto-btc").await.unwrap();
        assert_eq!(result.market_id, "crypto-btc");
        assert!(result.content.contains("**Market**: BTC/USD OTC"));
        assert_eq!(dash.analysis("crypto-btc").unwrap().content, result.content);
        assert!(!dash.is_analyzing());

        assert_eq!(dash.tick().await.cached_analyses, 1);
    }

    #[tokio::test]
    async fn test_request_analysis_unknown_market() {
        let dash = dashboard(Arc::new(LocalAnalyzer::new(Duration::ZERO)));
        let err = dash.request_analysis("nope").await.unwrap_err();
        assert!(matches!(err, DashboardError::UnknownMarket(_)));
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_cache_empty() {
        let dash = dashboard(Arc::new(AlwaysMissingKey));

        let err = dash.request_analysis("comm-gold").await.unwrap_err();
        assert!(matches!(err, DashboardError::Analysis(AnalysisError::MissingApiKey)));
        assert!(dash.analysis("comm-gold").is_none());
        assert!(!dash.is_analyzing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_resolve_per_market() {
        let delays = HashMap::from([
            ("crypto-btc".to_string(), Duration::from_millis(3000)),
            ("crypto-eth".to_string(), Duration::from_millis(500)),
        ]);
        let dash = Arc::new(dashboard(Arc::new(DelayedEcho { delays })));

        let slow = tokio::spawn({
            let dash = Arc::clone(&dash);
            async move { dash.request_analysis("crypto-btc").await }
        });
        tokio::task::yield_now().await;
        assert!(dash.is_analyzing());

        let fast = dash.request_analysis("crypto-eth").await.unwrap();
        assert!(fast.content.starts_with("analysis of crypto-eth"));
        assert!(dash.analysis("crypto-btc").is_none());
        assert!(dash.is_analyzing());

        let slow = slow.await.unwrap().unwrap();
        assert!(slow.content.starts_with("analysis of crypto-btc"));
        assert!(dash.analysis("crypto-eth").unwrap().content.starts_with("analysis of crypto-eth"));
        assert!(dash.analysis("crypto-btc").unwrap().content.starts_with("analysis of crypto-btc"));
        assert!(!dash.is_analyzing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_resolving_request_wins() {
        // The first call is slow and the second fast, so the earlier request lands last
        let delays = vec![Duration::from_millis(1000), Duration::from_millis(100)];
        let dash = Arc::new(dashboard(Arc::new(Countdown {
            calls: AtomicUsize::new(0),
            delays,
        })));

        let first = tokio::spawn({
            let dash = Arc::clone(&dash);
            async move { dash.request_analysis("ind-us30").await }
        });
        tokio::task::yield_now().await;
        let second = dash.request_analysis("ind-us30").await.unwrap();
        assert_eq!(second.content, "call 1");
        assert_eq!(dash.analysis("ind-us30").unwrap().content, "call 1");

        first.await.unwrap().unwrap();
        assert_eq!(dash.analysis("ind-us30").unwrap().content, "call 0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_clock_ticks_until_shutdown() {
        let dash = Arc::new(dashboard(Arc::new(LocalAnalyzer::new(Duration::ZERO))));
        let (tx, rx) = watch::channel(false);
        let logger = TickLogger::new(&MonitoringConfig::default());

        let handle = tokio::spawn(run_simulation(
            Arc::clone(&dash),
            Duration::from_millis(2000),
            logger,
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(6500)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(dash.ticks().await, 3);
        let market = dash.market("forex-eurusd").await.unwrap();
        assert_eq!(market.history.len(), 50);
        assert!(market.history.windows(2).all(|w| w[0].time <= w[1].time));
    }
}
