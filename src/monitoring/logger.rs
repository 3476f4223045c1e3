use crate::config::MonitoringConfig;
use crate::data::types::Market;
use crate::execution::types::TickReport;
use tracing::{debug, info, warn};

/// Writes tick activity to the tracing log, with a full market summary
/// every `summary_every_ticks` ticks
pub struct TickLogger {
    summary_every: u64,
    summaries: u64,
}

impl TickLogger {
    pub fn new(config: &MonitoringConfig) -> Self {
        Self {
            summary_every: config.summary_every_ticks,
            summaries: 0,
        }
    }

    /// Returns true when a summary was emitted for this tick
    pub fn record(&mut self, report: &TickReport, markets: &[Market]) -> bool {
        debug!("Tick {}: {} markets updated", report.tick, report.updated);

        if !report.skipped.is_empty() {
            warn!(
                "Tick {}: kept previous state for {}",
                report.tick,
                report.skipped.join(", ")
            );
        }

        if self.summary_every == 0 || report.tick % self.summary_every != 0 {
            return false;
        }

        self.summaries += 1;
        info!(
            "Market summary after {} ticks ({} markets analyzed):",
            report.tick, report.cached_analyses
        );
        for market in markets {
            info!("{}", summary_line(market));
        }
        true
    }

    pub fn summaries(&self) -> u64 {
        self.summaries
    }
}

/// One-line view of a market, e.g. `BTC/USD OTC 64,250.00 (+0.70%) RSI 65.0 MACD 120.5000 [High]`
pub fn summary_line(market: &Market) -> String {
    format!(
        "{} {} ({:+.2}%) RSI {:.1} MACD {:.4} [{}]",
        market.name,
        market.format_price(market.price),
        market.change_percent,
        market.rsi,
        market.macd,
        market.volatility
    )
}
