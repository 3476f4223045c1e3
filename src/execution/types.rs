#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SimulationError {
    #[error("Non-finite price for {market_id}: {price}")]
    NonFinitePrice { market_id: String, price: f64 },

    #[error("Non-positive price for {market_id}: {price}")]
    NonPositivePrice { market_id: String, price: f64 },
}

impl SimulationError {
    pub fn market_id(&self) -> &str {
        match self {
            SimulationError::NonFinitePrice { market_id, .. }
            | SimulationError::NonPositivePrice { market_id, .. } => market_id,
        }
    }
}

/// Summary of one simulation tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub updated: usize,
    /// Markets whose update was rejected and kept their previous state
    pub skipped: Vec<String>,
    /// Markets holding a cached analysis when the tick completed
    pub cached_analyses: usize,
}
