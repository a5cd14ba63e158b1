pub mod alert;
pub mod candle;
pub mod instrument;
pub mod signal;
pub mod tick;
