use crate::data::types::{Market, MarketCategory, Volatility};

struct Listing {
    id: &'static str,
    name: &'static str,
    category: MarketCategory,
    price: f64,
    previous_price: f64,
    change_percent: f64,
    rsi: f64,
    macd: f64,
    volatility: Volatility,
}

const LISTINGS: [Listing; 9] = [
    Listing {
        id: "forex-eurusd",
        name: "EUR/USD OTC",
        category: MarketCategory::Forex,
        price: 1.0845,
        previous_price: 1.0840,
        change_percent: 0.05,
        rsi: 52.0,
        macd: 0.0002,
        volatility: Volatility::Low,
    },
    Listing {
        id: "forex-gbpusd",
        name: "GBP/USD OTC",
        category: MarketCategory::Forex,
        price: 1.2630,
        previous_price: 1.2610,
        change_percent: 0.16,
        rsi: 58.0,
        macd: 0.0005,
        volatility: Volatility::Medium,
    },
    Listing {
        id: "crypto-btc",
        name: "BTC/USD OTC",
        category: MarketCategory::Crypto,
        price: 64_250.00,
        previous_price: 63_800.00,
        change_percent: 0.70,
        rsi: 65.0,
        macd: 120.5,
        volatility: Volatility::High,
    },
    Listing {
        id: "crypto-eth",
        name: "ETH/USD OTC",
        category: MarketCategory::Crypto,
        price: 3_450.00,
        previous_price: 3_420.00,
        change_percent: 0.88,
        rsi: 62.0,
        macd: 15.2,
        volatility: Volatility::High,
    },
    Listing {
        id: "comm-gold",
        name: "Gold (XAU) OTC",
        category: MarketCategory::Commodities,
        price: 2_340.50,
        previous_price: 2_335.00,
        change_percent: 0.24,
        rsi: 48.0,
        macd: -2.5,
        volatility: Volatility::Medium,
    },
    Listing {
        id: "comm-silver",
        name: "Silver (XAG) OTC",
        category: MarketCategory::Commodities,
        price: 28.45,
        previous_price: 28.20,
        change_percent: 0.89,
        rsi: 55.0,
        macd: 0.15,
        volatility: Volatility::High,
    },
    Listing {
        id: "ind-us30",
        name: "US30 OTC",
        category: MarketCategory::Indices,
        price: 39_100.00,
        previous_price: 39_150.00,
        change_percent: -0.13,
        rsi: 42.0,
        macd: -15.0,
        volatility: Volatility::Medium,
    },
    Listing {
        id: "ind-nas100",
        name: "NAS100 OTC",
        category: MarketCategory::Indices,
        price: 18_200.00,
        previous_price: 18_100.00,
        change_percent: 0.55,
        rsi: 68.0,
        macd: 45.0,
        volatility: Volatility::Medium,
    },
    Listing {
        id: "syn-vol75",
        name: "Vol75 Index OTC",
        category: MarketCategory::Synthetics,
        price: 450_000.00,
        previous_price: 445_000.00,
        change_percent: 1.12,
        rsi: 75.0,
        macd: 1_200.0,
        volatility: Volatility::High,
    },
];

/// The fixed set of instruments traded for the whole session, with empty history
pub fn initial_markets() -> Vec<Market> {
    LISTINGS
        .iter()
        .map(|l| Market {
            id: l.id.to_string(),
            name: l.name.to_string(),
            category: l.category,
            price: l.price,
            previous_price: l.previous_price,
            change_percent: l.change_percent,
            history: Vec::new(),
            rsi: l.rsi,
            macd: l.macd,
            volatility: l.volatility,
        })
        .collect()
}
