use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;

use super::types::BinanceKlineEvent;
use crate::error::AppError;
use crate::event::{AppEvent, WsConnectionStatus};
use crate::model::tick::CandleTick;

/// Exponential backoff for reconnection.
pub struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Kline stream name, e.g. `btcusdt@kline_1m`.
pub fn kline_stream(ticker: &str, interval: &str) -> String {
    format!("{}@kline_{}", ticker.trim().to_ascii_lowercase(), interval)
}

/// Parses one text frame; anything that is not a kline event is `None`.
pub fn parse_kline_message(text: &str) -> Option<CandleTick> {
    match serde_json::from_str::<BinanceKlineEvent>(text) {
        Ok(event) if event.event_type == "kline" => Some(event.to_tick()),
        Ok(event) => {
            tracing::debug!(event_type = %event.event_type, "Ignoring non-kline WS event");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse WS message");
            None
        }
    }
}

#[derive(Clone)]
pub struct BinanceWsClient {
    stream: String,
    url: String,
}

impl BinanceWsClient {
    pub fn new(ws_base_url: &str, stream: &str) -> Self {
        Self {
            stream: stream.to_string(),
            url: format!("{}/{}", ws_base_url.trim_end_matches('/'), stream),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_status(&self, status_tx: &mpsc::Sender<AppEvent>, status: WsConnectionStatus) {
        let _ = status_tx
            .send(AppEvent::WsStatus {
                stream: self.stream.clone(),
                status,
            })
            .await;
    }

    /// Connect and run the WebSocket loop with automatic reconnection.
    /// Ticks go to `tick_tx` in arrival order; status and log lines go to
    /// `status_tx`.
    pub async fn connect_and_run(
        &self,
        tick_tx: mpsc::Sender<CandleTick>,
        status_tx: mpsc::Sender<AppEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_secs(1),
            Duration::from_secs(60),
            2.0,
        );
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self
                .connect_once(&tick_tx, &status_tx, &mut shutdown, &mut backoff)
                .await
            {
                Ok(()) => {
                    // Clean shutdown requested
                    self.send_status(&status_tx, WsConnectionStatus::Disconnected)
                        .await;
                    break;
                }
                Err(e) => {
                    self.send_status(&status_tx, WsConnectionStatus::Disconnected)
                        .await;
                    tracing::warn!(stream = %self.stream, error = %e, "WS error");

                    let delay = backoff.next_delay();
                    self.send_status(
                        &status_tx,
                        WsConnectionStatus::Reconnecting {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        },
                    )
                    .await;

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!(stream = %self.stream, "Shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        tick_tx: &mpsc::Sender<CandleTick>,
        status_tx: &mpsc::Sender<AppEvent>,
        shutdown: &mut watch::Receiver<bool>,
        backoff: &mut ExponentialBackoff,
    ) -> Result<()> {
        tracing::info!(url = %self.url, "Connecting");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(&self.url)
            .await
            .context("WebSocket connect failed")?;

        backoff.reset();
        self.send_status(status_tx, WsConnectionStatus::Connected)
            .await;

        let (_write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            if let Some(tick) = parse_kline_message(&text) {
                                // Awaiting keeps per-stream order; ticks are never dropped.
                                if tick_tx.send(tick).await.is_err() {
                                    return Ok(());
                                }
                            }
                        }
                        Some(Ok(tungstenite::Message::Ping(_))) => {
                            // tokio-tungstenite handles pong automatically
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(AppError::WebSocket(format!("read error: {}", e)).into());
                        }
                        None => {
                            return Err(AppError::WebSocket("stream ended".to_string()).into());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    return Ok(());
                }
            }
        }
    }
}
