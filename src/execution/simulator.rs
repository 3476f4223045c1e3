use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::config::{SimulationConfig, MAX_SEED_STEP_SECS};
use crate::data::types::{round_to, Market, PricePoint, Volatility};
use crate::execution::types::SimulationError;
use tracing::{debug, warn};

pub const RSI_MIN: f64 = 10.0;
pub const RSI_MAX: f64 = 90.0;

/// Probability that a fluctuation moves the price up
const UP_PROBABILITY: f64 = 0.48;
const MACD_DRIFT_SCALE: f64 = 0.0001;

/// Signed random price move scaled by the volatility tier
pub fn fluctuation<R: Rng + ?Sized>(rng: &mut R, price: f64, volatility: Volatility) -> f64 {
    let direction = if rng.gen::<f64>() < UP_PROBABILITY { 1.0 } else { -1.0 };
    price * volatility.multiplier() * rng.gen::<f64>() * direction
}

/// Backward random walk ending at the market's current price, oldest sample first
pub fn seed_history<R: Rng + ?Sized>(
    rng: &mut R,
    market: &Market,
    count: usize,
    step: Duration,
    now: DateTime<Utc>,
) -> Vec<PricePoint> {
    let mut history = Vec::with_capacity(count);
    let mut price = market.price;

    for i in 1..=count as i32 {
        history.push(PricePoint {
            time: now - step * i,
            price: market.round_price(price),
        });
        price -= fluctuation(rng, price, market.volatility);
    }

    history.reverse();
    history
}

pub struct MarketSimulator {
    config: SimulationConfig,
    rng: StdRng,
    ticks: u64,
}

impl MarketSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
            ticks: 0,
        }
    }

    /// Reproducible simulator for tests
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Replace each market's history with a freshly seeded walk, never
    /// longer than the history window
    pub fn seed_markets(&mut self, markets: &mut [Market]) {
        let now = Utc::now();
        let step = Duration::seconds(self.config.seed_step_secs.min(MAX_SEED_STEP_SECS) as i64);
        let count = self.config.seed_history_len.min(self.config.history_window);
        for market in markets.iter_mut() {
            market.history = seed_history(&mut self.rng, market, count, step, now);
        }
    }

    /// Advance every market by one tick
    pub fn advance(&mut self, markets: &[Market]) -> (Vec<Market>, Vec<SimulationError>) {
        self.advance_at(markets, Utc::now())
    }

    /// Advance every market by one tick stamped `now`. A market whose update
    /// fails keeps its previous state; the others still move.
    pub fn advance_at(
        &mut self,
        markets: &[Market],
        now: DateTime<Utc>,
    ) -> (Vec<Market>, Vec<SimulationError>) {
        self.ticks += 1;
        let mut errors = Vec::new();

        let next = markets
            .iter()
            .map(|market| match self.advance_market(market, now) {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("Skipping update for {}: {}", market.id, e);
                    errors.push(e);
                    market.clone()
                }
            })
            .collect();

        debug!("Tick {} advanced {} markets", self.ticks, markets.len());
        (next, errors)
    }

    fn advance_market(
        &mut self,
        market: &Market,
        now: DateTime<Utc>,
    ) -> Result<Market, SimulationError> {
        let rng = &mut self.rng;

        // Random walk step, rejected if it leaves the positive reals
        let new_price = market.price + fluctuation(rng, market.price, market.volatility);
        if !new_price.is_finite() {
            return Err(SimulationError::NonFinitePrice {
                market_id: market.id.clone(),
                price: new_price,
            });
        }
        let rounded_price = market.round_price(new_price);
        if rounded_price <= 0.0 {
            return Err(SimulationError::NonPositivePrice {
                market_id: market.id.clone(),
                price: new_price,
            });
        }

        // RSI drifts up to 2 points either way, clamped to its band
        let direction = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        let rsi = (market.rsi + direction * rng.gen::<f64>() * 2.0).clamp(RSI_MIN, RSI_MAX);

        // MACD drifts by a small fraction of the pre-tick price
        let macd = market.macd + (rng.gen::<f64>() - 0.5) * market.price * MACD_DRIFT_SCALE;

        // Clock skew must not break history ordering
        let time = match market.history.last() {
            Some(last) if last.time > now => last.time,
            _ => now,
        };

        // Append the new sample and drop the oldest beyond the window
        let mut history = Vec::with_capacity(market.history.len() + 1);
        history.extend_from_slice(&market.history);
        history.push(PricePoint { time, price: rounded_price });
        if history.len() > self.config.history_window {
            let overflow = history.len() - self.config.history_window;
            history.drain(..overflow);
        }

        // Baseline is the oldest sample still retained
        let change_percent = change_against_baseline(rounded_price, &history);

        Ok(Market {
            previous_price: market.price,
            price: rounded_price,
            change_percent,
            history,
            rsi: round_to(rsi, 1),
            macd: round_to(macd, 4),
            ..market.clone()
        })
    }
}

/// Percent change against the oldest retained sample, rounded to 2 decimals
pub fn change_against_baseline(price: f64, history: &[PricePoint]) -> f64 {
    let baseline = history
        .first()
        .map(|p| p.price)
        .filter(|p| *p != 0.0)
        .unwrap_or(price);

    if baseline == 0.0 {
        return 0.0;
    }
    round_to((price - baseline) / baseline * 100.0, 2)
}
