use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::engine::AlertEngine;
use crate::event::AppEvent;
use crate::model::tick::CandleTick;

pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Logs the read-only instrument snapshot as JSON.
pub fn log_status(engine: &AlertEngine) {
    for state in engine.instruments() {
        let gap_pct = if state.ema_slow.abs() > f64::EPSILON {
            (state.ema_fast - state.ema_slow) / state.ema_slow * 100.0
        } else {
            0.0
        };
        tracing::info!(
            symbol = %state.symbol,
            price = state.price,
            ema_fast = state.ema_fast,
            ema_slow = state.ema_slow,
            gap_pct,
            touching = state.is_touching,
            history = state.history.len(),
            "Instrument status"
        );
    }
    match serde_json::to_string(&engine.alerts()) {
        Ok(json) => tracing::debug!(alerts = %json, "Alert log"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize alert log"),
    }
}

/// The single engine task: each tick is applied to completion before the
/// next is read. Recorded alerts are offered to `app_tx` without waiting.
/// Returns the engine when the tick channel closes or shutdown is signalled.
pub async fn run_engine<F>(
    mut engine: AlertEngine,
    mut tick_rx: mpsc::Receiver<CandleTick>,
    app_tx: mpsc::Sender<AppEvent>,
    mut shutdown: watch::Receiver<bool>,
    status_every: Option<Duration>,
    clock: F,
) -> AlertEngine
where
    F: Fn() -> u64,
{
    let mut status = status_every.map(tokio::time::interval);

    loop {
        tokio::select! {
            tick = tick_rx.recv() => {
                let Some(tick) = tick else {
                    tracing::info!("Tick channel closed, engine task exiting");
                    break;
                };
                if let Some(alert) = engine.on_tick(&tick, clock()) {
                    if app_tx.try_send(AppEvent::Alert(alert)).is_err() {
                        tracing::warn!("App channel full, alert not forwarded");
                    }
                }
            }
            _ = async {
                match status.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => {
                log_status(&engine);
            }
            _ = shutdown.changed() => {
                tracing::info!("Engine task shutting down");
                break;
            }
        }
    }
    engine
}
