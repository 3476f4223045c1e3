use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCategory {
    Forex,
    Crypto,
    Commodities,
    Indices,
    Synthetics,
}

impl MarketCategory {
    /// Decimal digits used for every stored and displayed price
    pub fn precision(self) -> usize {
        match self {
            MarketCategory::Forex | MarketCategory::Commodities => 4,
            MarketCategory::Crypto | MarketCategory::Indices | MarketCategory::Synthetics => 2,
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    Medium,
    High,
}

impl Volatility {
    /// Fraction of the price a single fluctuation draw can move
    pub fn multiplier(self) -> f64 {
        match self {
            Volatility::Low => 0.0001,
            Volatility::Medium => 0.0005,
            Volatility::High => 0.0015,
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    /// Chart axis label (HH:MM:SS)
    pub fn label(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > 70.0 {
            RsiZone::Overbought
        } else if rsi < 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RsiZone::Overbought => "overbought",
            RsiZone::Oversold => "oversold",
            RsiZone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendStrength {
    Strong,
    Weak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub name: String,
    pub category: MarketCategory,
    pub price: f64,
    pub previous_price: f64,
    /// Change against the oldest retained history sample, not the previous tick
    pub change_percent: f64,
    pub history: Vec<PricePoint>,
    pub rsi: f64,
    pub macd: f64,
    pub volatility: Volatility,
}

impl Market {
    pub fn precision(&self) -> usize {
        self.category.precision()
    }

    /// Round a price to this market's category precision
    pub fn round_price(&self, value: f64) -> f64 {
        round_to(value, self.precision())
    }

    pub fn format_price(&self, value: f64) -> String {
        format_grouped(value, self.precision())
    }

    pub fn session_high(&self) -> f64 {
        self.round_price(self.price * 1.01)
    }

    pub fn session_low(&self) -> f64 {
        self.round_price(self.price * 0.99)
    }

    pub fn trend_strength(&self) -> TrendStrength {
        if self.change_percent.abs() > 0.5 {
            TrendStrength::Strong
        } else {
            TrendStrength::Weak
        }
    }

    pub fn rsi_zone(&self) -> RsiZone {
        RsiZone::from_rsi(self.rsi)
    }

    /// Move since the previous tick, for display only
    pub fn price_delta(&self) -> f64 {
        self.round_price(self.price - self.previous_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub market_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Round half away from zero to `digits` decimals. A result of zero is
/// always `+0.0` so it never prints as `-0`.
pub fn round_to(value: f64, digits: usize) -> f64 {
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Fixed-precision number with comma thousands separators, e.g. `64,250.00`
pub fn format_grouped(value: f64, digits: usize) -> String {
    let fixed = format!("{:.*}", digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
