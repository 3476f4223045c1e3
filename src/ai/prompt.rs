use crate::data::types::Market;

fn recent_trend(change_percent: f64) -> &'static str {
    if change_percent > 0.0 {
        "Uptrend"
    } else if change_percent < 0.0 {
        "Downtrend"
    } else {
        "Sideways"
    }
}

/// User prompt carrying the market fields a remote model needs
pub fn build_prompt(market: &Market) -> String {
    format!(
        "Analyze the following OTC market data and provide a trading signal:\n\
         \n\
         Market: {}\n\
         Category: {}\n\
         Current Price: {}\n\
         24h Change: {}%\n\
         RSI (14): {}\n\
         MACD: {}\n\
         Volatility: {}\n\
         Recent Trend: {}\n\
         \n\
         Based on this data, is this a good time to enter? \
         Use your strategies defined in the system instructions.",
        market.name,
        market.category,
        market.price,
        market.change_percent,
        market.rsi,
        market.macd,
        market.volatility,
        recent_trend(market.change_percent),
    )
}
