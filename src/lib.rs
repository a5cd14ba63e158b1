pub mod alert_sequencer;
pub mod binance;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod indicator;
pub mod instrument_store;
pub mod model;
pub mod notifier;
pub mod runner;
pub mod signal_detector;
