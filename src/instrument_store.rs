use std::collections::{HashMap, VecDeque};

use crate::error::SeedError;
use crate::indicator::ema::{batch_ema, step_ema};
use crate::model::candle::{closes, Candle};
use crate::model::instrument::{normalize_ticker, Instrument, InstrumentState};
use crate::model::signal::SignalKind;
use crate::signal_detector::{detect, EmaPair, DEFAULT_TOUCH_BAND_RATIO};

pub const DEFAULT_FAST_PERIOD: usize = 20;
pub const DEFAULT_SLOW_PERIOD: usize = 100;
pub const DEFAULT_HISTORY_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub touch_band_ratio: f64,
    pub history_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
            touch_band_ratio: DEFAULT_TOUCH_BAND_RATIO,
            history_len: DEFAULT_HISTORY_LEN,
        }
    }
}

/// Result of applying one tick to a known instrument.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub state: InstrumentState,
    pub signal: Option<SignalKind>,
}

/// Per-instrument indicator state, keyed by instrument label.
#[derive(Debug, Default)]
pub struct InstrumentStore {
    config: StoreConfig,
    states: HashMap<String, InstrumentState>,
    // exchange ticker -> label
    tickers: HashMap<String, String>,
    // labels in seeding order, for stable snapshots
    order: Vec<String>,
}

impl InstrumentStore {
    pub fn new(config: StoreConfig) -> Self {
        assert!(
            config.fast_period > 0 && config.slow_period > 0,
            "EMA period must be > 0"
        );
        assert!(config.history_len > 0, "history_len must be > 0");
        Self {
            config,
            states: HashMap::new(),
            tickers: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Seed an instrument from closed candles (oldest first). Both EMAs must be
    /// computable, otherwise the store is left as it was.
    pub fn initialize(
        &mut self,
        instrument: &Instrument,
        seed: &[Candle],
    ) -> Result<&InstrumentState, SeedError> {
        let needed = self.config.fast_period.max(self.config.slow_period);
        let insufficient = || SeedError::InsufficientData {
            symbol: instrument.label.clone(),
            needed,
            got: seed.len(),
        };

        let closes = closes(seed);
        let fast = batch_ema(&closes, self.config.fast_period)
            .last()
            .copied()
            .flatten()
            .ok_or_else(insufficient)?;
        let slow = batch_ema(&closes, self.config.slow_period)
            .last()
            .copied()
            .flatten()
            .ok_or_else(insufficient)?;
        let price = closes.last().copied().ok_or_else(insufficient)?;

        let keep_from = seed.len().saturating_sub(self.config.history_len);
        let history: VecDeque<Candle> = seed[keep_from..].iter().copied().collect();

        let state = InstrumentState {
            symbol: instrument.label.clone(),
            price,
            ema_fast: fast,
            ema_slow: slow,
            is_touching: false,
            history,
        };

        let label = instrument.label.clone();
        if !self.states.contains_key(&label) {
            self.order.push(label.clone());
        }
        self.tickers
            .retain(|_, mapped| mapped.as_str() != label.as_str());
        self.tickers
            .insert(normalize_ticker(&instrument.ticker), label.clone());
        self.states.insert(label.clone(), state);
        Ok(&self.states[&label])
    }

    /// Advance both EMAs for `ticker` by one close and re-evaluate the signal.
    /// Unknown tickers are ignored.
    pub fn apply_tick(
        &mut self,
        ticker: &str,
        close: f64,
        is_final: bool,
        candle: Candle,
    ) -> Option<TickOutcome> {
        let label = self.tickers.get(&normalize_ticker(ticker))?;
        let state = self.states.get_mut(label)?;
        let cfg = self.config;

        let prev = EmaPair::new(state.ema_fast, state.ema_slow);
        let next = EmaPair::new(
            step_ema(close, state.ema_fast, cfg.fast_period),
            step_ema(close, state.ema_slow, cfg.slow_period),
        );
        let detection = detect(prev, next, cfg.touch_band_ratio);

        state.price = close;
        state.ema_fast = next.fast;
        state.ema_slow = next.slow;
        state.is_touching = detection.is_touching;

        if is_final {
            // The seed's last row can be this same bar while it was still open.
            match state.history.back_mut() {
                Some(last) if last.time == candle.time => *last = candle,
                _ => state.history.push_back(candle),
            }
            while state.history.len() > cfg.history_len {
                state.history.pop_front();
            }
        }

        Some(TickOutcome {
            state: state.clone(),
            signal: detection.kind,
        })
    }

    pub fn get(&self, label: &str) -> Option<&InstrumentState> {
        self.states.get(label)
    }

    pub fn label_for_ticker(&self, ticker: &str) -> Option<&str> {
        self.tickers
            .get(&normalize_ticker(ticker))
            .map(String::as_str)
    }

    /// Read-only copies in seeding order.
    pub fn snapshot(&self) -> Vec<InstrumentState> {
        self.order
            .iter()
            .filter_map(|label| self.states.get(label).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
