use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    NoTrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Structured outcome of the threshold rules for one market snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    pub market_id: String,
    pub trend: Trend,
    pub signal: Signal,
    pub confidence: Confidence,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Up => "Up",
            Trend::Down => "Down",
            Trend::Sideways => "Sideways",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "Buy",
            Signal::Sell => "Sell",
            Signal::NoTrade => "No Trade",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        f.write_str(s)
    }
}
