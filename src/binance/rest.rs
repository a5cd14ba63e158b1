use anyhow::{Context, Result};

use crate::error::AppError;
use crate::model::candle::Candle;

use super::types::{parse_klines, BinanceApiErrorResponse};

/// Public market-data endpoints only; nothing here is signed.
#[derive(Clone)]
pub struct BinanceRestClient {
    http: reqwest::Client,
    base_url: String,
}

impl BinanceRestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn klines_url(&self, symbol: &str, interval: &str, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.to_ascii_uppercase(),
            interval,
            limit
        )
    }

    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v3/ping", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .context("ping failed")?
            .error_for_status()
            .context("ping returned error status")?;
        Ok(())
    }

    /// Closed and in-progress candles, oldest first. The last row is usually
    /// the still-open bar.
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = self.klines_url(symbol, interval, limit);
        tracing::debug!(symbol, interval, limit, "Fetching klines");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("get_klines HTTP failed")?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<BinanceApiErrorResponse>(&body) {
                return Err(AppError::BinanceApi {
                    code: err.code,
                    msg: err.msg,
                }
                .into());
            }
            return Err(anyhow::anyhow!("Klines request failed: {}", body));
        }

        let body: serde_json::Value = resp.json().await.context("klines body is not JSON")?;
        parse_klines(&body)
    }
}
