use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("binance API error (code {code}): {msg}")]
    BinanceApi { code: i64, msg: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

/// Seeding failures leave the store untouched; the instrument is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeedError {
    #[error("{symbol}: insufficient seed data ({got} candles, need {needed})")]
    InsufficientData {
        symbol: String,
        needed: usize,
        got: usize,
    },
}
