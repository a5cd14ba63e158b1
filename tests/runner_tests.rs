use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, watch};

use ema_sentinel::engine::{AlertEngine, EngineConfig};
use ema_sentinel::event::AppEvent;
use ema_sentinel::model::candle::Candle;
use ema_sentinel::model::instrument::Instrument;
use ema_sentinel::model::signal::SignalKind;
use ema_sentinel::model::tick::CandleTick;
use ema_sentinel::runner::run_engine;

fn seeded_engine() -> AlertEngine {
    let seed: Vec<Candle> = (0..100u64)
        .map(|i| Candle {
            time: i * 60_000,
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
        })
        .collect();
    let mut engine = AlertEngine::new(EngineConfig::default());
    engine
        .seed(&Instrument::new("BTC/USDT", "BTCUSDT"), &seed)
        .unwrap();
    engine
}

fn tick(close: f64) -> CandleTick {
    CandleTick {
        symbol: "BTCUSDT".to_string(),
        close,
        is_final: true,
        open: close,
        high: close,
        low: close,
        time: 6_000_000,
    }
}

#[test]
fn engine_task_processes_ticks_in_order_and_forwards_alerts() {
    tokio_test::block_on(async {
        let (tick_tx, tick_rx) = mpsc::channel(16);
        let (app_tx, mut app_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let clock = AtomicU64::new(0);

        tick_tx.send(tick(100.0)).await.unwrap();
        tick_tx.send(tick(100.0)).await.unwrap();
        tick_tx.send(tick(110.0)).await.unwrap();
        drop(tick_tx);

        let engine = run_engine(
            seeded_engine(),
            tick_rx,
            app_tx,
            shutdown_rx,
            None,
            || clock.fetch_add(400_000, Ordering::SeqCst),
        )
        .await;

        let mut kinds = Vec::new();
        while let Ok(AppEvent::Alert(alert)) = app_rx.try_recv() {
            kinds.push(alert.kind);
        }
        assert_eq!(
            kinds,
            vec![SignalKind::Touch, SignalKind::Touch, SignalKind::BullishCross]
        );
        assert_eq!(engine.alerts().len(), 3);
        assert_eq!(engine.instrument("BTC/USDT").unwrap().history.len(), 103);
    });
}

#[test]
fn shutdown_stops_engine_task() {
    tokio_test::block_on(async {
        let (_tick_tx, tick_rx) = mpsc::channel::<CandleTick>(1);
        let (app_tx, _app_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let engine = run_engine(seeded_engine(), tick_rx, app_tx, shutdown_rx, None, || 0).await;
        assert!(engine.alerts().is_empty());
    });
}
