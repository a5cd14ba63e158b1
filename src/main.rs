use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::{mpsc, watch};

use ema_sentinel::binance::rest::BinanceRestClient;
use ema_sentinel::binance::ws::{kline_stream, BinanceWsClient};
use ema_sentinel::config::Config;
use ema_sentinel::engine::AlertEngine;
use ema_sentinel::event::{AppEvent, WsConnectionStatus};
use ema_sentinel::model::instrument::Instrument;
use ema_sentinel::model::tick::CandleTick;
use ema_sentinel::notifier::{
    spawn_dispatcher, BellNotifier, DesktopNotifier, LogNotifier, NotifierSet,
};
use ema_sentinel::runner::{log_status, now_ms, run_engine};

fn build_notifiers(config: &Config) -> NotifierSet {
    let mut set = NotifierSet::new().with(Box::new(LogNotifier));
    if config.notify.desktop_enabled {
        match DesktopNotifier::from_command_line(&config.notify.desktop_command) {
            Some(desktop) => {
                tracing::info!(program = %desktop.program(), "Desktop notifications enabled");
                set = set.with(Box::new(desktop));
            }
            None => tracing::warn!("notify.desktop_command is empty, desktop notifications off"),
        }
    }
    if config.notify.sound_enabled {
        set = set.with(Box::new(BellNotifier));
    }
    set
}

async fn seed_engine(
    engine: &mut AlertEngine,
    rest_client: &BinanceRestClient,
    config: &Config,
) -> Vec<Instrument> {
    let mut seeded = Vec::new();
    for instrument in config.binance.tracked_instruments() {
        let candles = match rest_client
            .get_klines(
                &instrument.ticker,
                &config.binance.kline_interval,
                config.binance.seed_limit,
            )
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                tracing::warn!(symbol = %instrument.label, error = %e, "Seed fetch failed, instrument omitted");
                continue;
            }
        };
        match engine.seed(&instrument, &candles) {
            Ok(()) => seeded.push(instrument),
            Err(e) => tracing::warn!(error = %e, "Instrument omitted"),
        }
    }
    seeded
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        bail!("failed to install rustls crypto provider");
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Set EMA_SENTINEL_CONFIG or create config/default.toml");
            std::process::exit(1);
        }
    };

    let log_file = std::fs::File::create("ema-sentinel.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    tracing::info!(
        rest_url = %config.binance.rest_base_url,
        ws_url = %config.binance.ws_base_url,
        interval = %config.binance.kline_interval,
        instruments = config.binance.instruments.len(),
        "Starting ema-sentinel"
    );

    let rest_client = BinanceRestClient::new(&config.binance.rest_base_url);
    if let Err(e) = rest_client.ping().await {
        tracing::warn!(error = %e, "Binance ping failed, trying seed fetch anyway");
    }

    let mut engine = AlertEngine::new(config.engine.engine_config());
    let seeded = seed_engine(&mut engine, &rest_client, &config).await;
    if seeded.is_empty() {
        bail!("no instrument could be seeded");
    }
    log_status(&engine);

    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(256);
    let (tick_tx, tick_rx) = mpsc::channel::<CandleTick>(1024);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (notify_tx, notify_handle) =
        spawn_dispatcher(build_notifiers(&config), config.notify.queue_len);

    for instrument in &seeded {
        let stream = kline_stream(&instrument.ticker, &config.binance.kline_interval);
        let client = BinanceWsClient::new(&config.binance.ws_base_url, &stream);
        let worker_tick_tx = tick_tx.clone();
        let worker_app_tx = app_tx.clone();
        let worker_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = client
                .connect_and_run(worker_tick_tx, worker_app_tx, worker_shutdown)
                .await
            {
                tracing::warn!(stream = %stream, error = %e, "WS worker failed");
            }
        });
    }
    drop(tick_tx);

    let status_every = match config.ui.status_interval_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let engine_task = tokio::spawn(run_engine(
        engine,
        tick_rx,
        app_tx.clone(),
        shutdown_rx.clone(),
        status_every,
        now_ms,
    ));
    drop(app_tx);

    loop {
        tokio::select! {
            event = app_rx.recv() => {
                match event {
                    Some(AppEvent::Alert(alert)) => {
                        if notify_tx.try_send(alert).is_err() {
                            tracing::warn!("Notification queue full, alert notification dropped");
                        }
                    }
                    Some(AppEvent::WsStatus { stream, status }) => match status {
                        WsConnectionStatus::Connected => {
                            tracing::info!(stream = %stream, "WebSocket connected");
                        }
                        WsConnectionStatus::Disconnected => {
                            tracing::warn!(stream = %stream, "WebSocket disconnected");
                        }
                        WsConnectionStatus::Reconnecting { attempt, delay_ms } => {
                            tracing::info!(stream = %stream, attempt, delay_ms, "WebSocket reconnecting");
                        }
                    },
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    match engine_task.await {
        Ok(engine) => {
            log_status(&engine);
            tracing::info!(alerts = engine.sequencer().len(), "Engine stopped");
        }
        Err(e) => tracing::error!(error = %e, "Engine task failed"),
    }
    drop(notify_tx);
    let _ = notify_handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
