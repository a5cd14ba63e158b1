use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::alert_sequencer::{DEFAULT_ALERT_COOLDOWN_MS, DEFAULT_ALERT_LOG_LEN};
use crate::engine::EngineConfig;
use crate::instrument_store::{
    StoreConfig, DEFAULT_FAST_PERIOD, DEFAULT_HISTORY_LEN, DEFAULT_SLOW_PERIOD,
};
use crate::model::instrument::Instrument;
use crate::signal_detector::DEFAULT_TOUCH_BAND_RATIO;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CONFIG_PATH_ENV: &str = "EMA_SENTINEL_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub binance: BinanceConfig,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceConfig {
    pub rest_base_url: String,
    pub ws_base_url: String,
    pub kline_interval: String,
    #[serde(default = "default_seed_limit")]
    pub seed_limit: usize,
    pub instruments: Vec<InstrumentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentEntry {
    pub label: String,
    pub ticker: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub fast_period: usize,
    pub slow_period: usize,
    pub touch_band_ratio: f64,
    pub history_len: usize,
    pub alert_log_len: usize,
    pub alert_cooldown_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
            touch_band_ratio: DEFAULT_TOUCH_BAND_RATIO,
            history_len: DEFAULT_HISTORY_LEN,
            alert_log_len: DEFAULT_ALERT_LOG_LEN,
            alert_cooldown_ms: DEFAULT_ALERT_COOLDOWN_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub desktop_enabled: bool,
    pub desktop_command: String,
    pub sound_enabled: bool,
    pub queue_len: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            desktop_enabled: false,
            desktop_command: "notify-send".to_string(),
            sound_enabled: false,
            queue_len: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub status_interval_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_seed_limit() -> usize {
    DEFAULT_HISTORY_LEN
}

/// Parse a Binance kline interval string (e.g. "1s", "1m", "1h", "1d", "1w", "1M") into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    let split = match s.char_indices().last() {
        Some((idx, _)) if idx > 0 => idx,
        _ => bail!("invalid interval '{}': expected format like '1m'", s),
    };

    let (num_str, suffix) = s.split_at(split);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 7 * 86_400_000,
        "M" => 30 * 86_400_000,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d/w/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl BinanceConfig {
    pub fn kline_interval_ms(&self) -> Result<u64> {
        parse_interval_ms(&self.kline_interval)
    }

    /// Configured instruments with blank entries dropped and duplicate tickers
    /// collapsed onto the first occurrence.
    pub fn tracked_instruments(&self) -> Vec<Instrument> {
        let mut out: Vec<Instrument> = Vec::new();
        for entry in &self.instruments {
            if entry.ticker.trim().is_empty() {
                continue;
            }
            let label = if entry.label.trim().is_empty() {
                entry.ticker.as_str()
            } else {
                entry.label.as_str()
            };
            let instrument = Instrument::new(label, &entry.ticker);
            if !out.iter().any(|i| i.ticker == instrument.ticker) {
                out.push(instrument);
            }
        }
        out
    }
}

impl EngineSection {
    pub fn validate(&self) -> Result<()> {
        if self.fast_period == 0 || self.slow_period == 0 {
            bail!("engine periods must be > 0");
        }
        if self.fast_period >= self.slow_period {
            bail!(
                "engine.fast_period ({}) must be less than engine.slow_period ({})",
                self.fast_period,
                self.slow_period
            );
        }
        if !(self.touch_band_ratio >= 0.0 && self.touch_band_ratio.is_finite()) {
            bail!("engine.touch_band_ratio must be a finite, non-negative number");
        }
        if self.history_len == 0 || self.alert_log_len == 0 {
            bail!("engine.history_len and engine.alert_log_len must be > 0");
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            store: StoreConfig {
                fast_period: self.fast_period,
                slow_period: self.slow_period,
                touch_band_ratio: self.touch_band_ratio,
                history_len: self.history_len,
            },
            alert_log_len: self.alert_log_len,
            alert_cooldown_ms: self.alert_cooldown_ms,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("invalid config TOML")?;

        config
            .binance
            .kline_interval_ms()
            .context("binance.kline_interval is invalid")?;
        config.engine.validate()?;
        if config.binance.tracked_instruments().is_empty() {
            bail!("binance.instruments must list at least one instrument");
        }
        if config.binance.seed_limit < config.engine.slow_period {
            bail!(
                "binance.seed_limit ({}) must cover engine.slow_period ({})",
                config.binance.seed_limit,
                config.engine.slow_period
            );
        }

        Ok(config)
    }
}
