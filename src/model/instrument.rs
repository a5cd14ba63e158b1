use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::candle::Candle;

/// A tracked market: `label` is shown to people, `ticker` goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Instrument {
    pub label: String,
    pub ticker: String,
}

impl Instrument {
    pub fn new(label: &str, ticker: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            ticker: normalize_ticker(ticker),
        }
    }
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}

/// Live indicator state for one instrument. Both EMAs are always seeded.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentState {
    pub symbol: String,
    pub price: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub is_touching: bool,
    pub history: VecDeque<Candle>,
}

impl InstrumentState {
    pub fn last_closed(&self) -> Option<&Candle> {
        self.history.back()
    }
}
