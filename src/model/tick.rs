use super::candle::Candle;

/// One live kline update for an instrument, keyed by exchange ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleTick {
    pub symbol: String,
    pub close: f64,
    /// True on the last update of a bar; only then is the bar kept in history.
    pub is_final: bool,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub time: u64,
}

impl CandleTick {
    pub fn candle(&self) -> Candle {
        Candle {
            time: self.time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }
}
