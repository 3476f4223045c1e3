use crate::data::types::{Market, Volatility};
use crate::strategies::types::{Confidence, Signal, SignalReport, Trend};

pub const OVERSOLD_RSI: f64 = 30.0;
pub const OVERBOUGHT_RSI: f64 = 70.0;
pub const MACD_THRESHOLD: f64 = 0.0002;
pub const TREND_THRESHOLD: f64 = 0.1;
pub const STOP_LOSS_PCT: f64 = 0.005;
pub const TAKE_PROFIT_PCT: f64 = 0.01;
/// Fixed label; 0.5% risk against 1% target
pub const RISK_REWARD: &str = "1:2";

pub fn classify_trend(change_percent: f64) -> Trend {
    if change_percent > TREND_THRESHOLD {
        Trend::Up
    } else if change_percent < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

/// Threshold rules, first match wins:
/// 1. oversold RSI with positive change -> Buy / High
/// 2. overbought RSI with non-positive change -> Sell / High
/// 3. MACD magnitude above threshold -> direction of change / Medium
/// 4. otherwise No Trade / Low
pub fn decide(rsi: f64, change_percent: f64, macd: f64) -> (Signal, Confidence) {
    let is_bullish = change_percent > 0.0;

    if rsi < OVERSOLD_RSI && is_bullish {
        (Signal::Buy, Confidence::High)
    } else if rsi > OVERBOUGHT_RSI && !is_bullish {
        (Signal::Sell, Confidence::High)
    } else if macd.abs() > MACD_THRESHOLD {
        let signal = if is_bullish { Signal::Buy } else { Signal::Sell };
        (signal, Confidence::Medium)
    } else {
        (Signal::NoTrade, Confidence::Low)
    }
}

/// Stop loss and take profit around `entry`. No Trade uses the Sell layout
/// as a display placeholder.
pub fn price_levels(signal: Signal, entry: f64) -> (f64, f64) {
    match signal {
        Signal::Buy => (
            entry * (1.0 - STOP_LOSS_PCT),
            entry * (1.0 + TAKE_PROFIT_PCT),
        ),
        Signal::Sell | Signal::NoTrade => (
            entry * (1.0 + STOP_LOSS_PCT),
            entry * (1.0 - TAKE_PROFIT_PCT),
        ),
    }
}

pub fn evaluate(market: &Market) -> SignalReport {
    let trend = classify_trend(market.change_percent);
    let (signal, confidence) = decide(market.rsi, market.change_percent, market.macd);
    let entry = market.price;
    let (stop_loss, take_profit) = price_levels(signal, entry);

    SignalReport {
        market_id: market.id.clone(),
        trend,
        signal,
        confidence,
        entry,
        stop_loss,
        take_profit,
    }
}

fn reasoning(market: &Market, report: &SignalReport) -> String {
    let movement = match report.signal {
        Signal::Buy => "upward",
        Signal::Sell => "downward",
        Signal::NoTrade => "ranging",
    };
    let sizing = match market.volatility {
        Volatility::High => "caution with wider stops",
        Volatility::Low | Volatility::Medium => "standard position sizing",
    };

    format!(
        "Internal technical algorithms detected {} momentum. RSI is currently at **{}**, \
         which indicates {} conditions. MACD divergence suggests potential {} movement. \
         Volatility is **{}**, suggesting {}.",
        report.trend.to_string().to_lowercase(),
        market.rsi,
        market.rsi_zone().as_str(),
        movement,
        market.volatility,
        sizing,
    )
}

/// Labeled Markdown block with every price at the market's category precision
pub fn render(market: &Market, report: &SignalReport) -> String {
    format!(
        "**Market**: {}\n\
         **Trend**: {}\n\
         **Signal**: {}\n\
         **Entry**: {}\n\
         **Stop Loss**: {}\n\
         **Take Profit**: {}\n\
         **Risk-Reward**: {}\n\
         **Confidence Level**: {}\n\
         \n\
         **Reasoning**:\n\
         {}\n",
        market.name,
        report.trend,
        report.signal,
        market.format_price(report.entry),
        market.format_price(report.stop_loss),
        market.format_price(report.take_profit),
        RISK_REWARD,
        report.confidence,
        reasoning(market, report),
    )
}
