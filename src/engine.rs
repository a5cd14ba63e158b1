use crate::alert_sequencer::{AlertSequencer, DEFAULT_ALERT_COOLDOWN_MS, DEFAULT_ALERT_LOG_LEN};
use crate::error::SeedError;
use crate::instrument_store::{InstrumentStore, StoreConfig};
use crate::model::alert::AlertEvent;
use crate::model::candle::Candle;
use crate::model::instrument::{Instrument, InstrumentState};
use crate::model::signal::Signal;
use crate::model::tick::CandleTick;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub alert_log_len: usize,
    pub alert_cooldown_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            alert_log_len: DEFAULT_ALERT_LOG_LEN,
            alert_cooldown_ms: DEFAULT_ALERT_COOLDOWN_MS,
        }
    }
}

/// Owns all indicator state and the alert log. Every tick goes through
/// [`AlertEngine::on_tick`]; nothing else mutates instrument state.
#[derive(Debug)]
pub struct AlertEngine {
    store: InstrumentStore,
    sequencer: AlertSequencer,
}

impl AlertEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: InstrumentStore::new(config.store),
            sequencer: AlertSequencer::new(config.alert_log_len, config.alert_cooldown_ms),
        }
    }

    pub fn seed(&mut self, instrument: &Instrument, candles: &[Candle]) -> Result<(), SeedError> {
        let state = self.store.initialize(instrument, candles)?;
        tracing::info!(
            symbol = %state.symbol,
            price = state.price,
            ema_fast = state.ema_fast,
            ema_slow = state.ema_slow,
            history = state.history.len(),
            "Instrument seeded"
        );
        Ok(())
    }

    /// Apply one tick and return the alert it produced, if any. Unknown
    /// tickers and suppressed signals both yield `None`.
    pub fn on_tick(&mut self, tick: &CandleTick, now_ms: u64) -> Option<AlertEvent> {
        let Some(outcome) =
            self.store
                .apply_tick(&tick.symbol, tick.close, tick.is_final, tick.candle())
        else {
            tracing::trace!(symbol = %tick.symbol, "Tick for unknown instrument ignored");
            return None;
        };

        let kind = outcome.signal?;
        let signal = Signal {
            kind,
            symbol: outcome.state.symbol,
            price: tick.close,
        };
        match self.sequencer.record(&signal, now_ms) {
            Some(alert) => {
                tracing::info!(
                    id = %alert.id,
                    symbol = %alert.symbol,
                    kind = %alert.kind,
                    price = alert.price,
                    "Alert recorded"
                );
                Some(alert)
            }
            None => {
                tracing::debug!(
                    symbol = %signal.symbol,
                    kind = %signal.kind,
                    "Alert suppressed by cooldown"
                );
                None
            }
        }
    }

    pub fn instrument(&self, label: &str) -> Option<&InstrumentState> {
        self.store.get(label)
    }

    pub fn instruments(&self) -> Vec<InstrumentState> {
        self.store.snapshot()
    }

    /// Newest first.
    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.sequencer.alerts().cloned().collect()
    }

    pub fn store(&self) -> &InstrumentStore {
        &self.store
    }

    pub fn sequencer(&self) -> &AlertSequencer {
        &self.sequencer
    }
}
