use serde::Serialize;

use super::signal::SignalKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub id: String,
    /// Instrument label, not the exchange ticker.
    pub symbol: String,
    pub timestamp_ms: u64,
    pub price: f64,
    pub kind: SignalKind,
}
