use serde::Deserialize;

use crate::model::candle::Candle;
use crate::model::tick::CandleTick;

/// Deserialize Binance string-encoded numbers to f64.
pub fn string_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

fn value_to_f64(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// One row of `GET /api/v3/klines`:
/// `[openTime, open, high, low, close, volume, closeTime, ...]`.
pub fn parse_kline_row(row: &serde_json::Value) -> Option<Candle> {
    let arr = row.as_array()?;
    Some(Candle {
        time: arr.first()?.as_u64()?,
        open: value_to_f64(arr.get(1)?)?,
        high: value_to_f64(arr.get(2)?)?,
        low: value_to_f64(arr.get(3)?)?,
        close: value_to_f64(arr.get(4)?)?,
    })
}

/// Parses a klines response body, skipping malformed rows. A non-array body
/// yields an error.
pub fn parse_klines(body: &serde_json::Value) -> anyhow::Result<Vec<Candle>> {
    let rows = body
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("klines response is not an array"))?;
    let candles: Vec<Candle> = rows.iter().filter_map(parse_kline_row).collect();
    if candles.len() < rows.len() {
        tracing::warn!(
            skipped = rows.len() - candles.len(),
            "Dropped malformed kline rows"
        );
    }
    Ok(candles)
}

/// Binance kline stream event (symbol@kline_<interval>).
#[derive(Debug, Deserialize)]
pub struct BinanceKlineEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: BinanceKline,
}

#[derive(Debug, Deserialize)]
pub struct BinanceKline {
    #[serde(rename = "t")]
    pub open_time: u64,
    #[serde(rename = "o", deserialize_with = "string_to_f64")]
    pub open: f64,
    #[serde(rename = "h", deserialize_with = "string_to_f64")]
    pub high: f64,
    #[serde(rename = "l", deserialize_with = "string_to_f64")]
    pub low: f64,
    #[serde(rename = "c", deserialize_with = "string_to_f64")]
    pub close: f64,
    #[serde(rename = "x")]
    pub is_closed: bool,
}

impl BinanceKlineEvent {
    pub fn to_tick(&self) -> CandleTick {
        CandleTick {
            symbol: self.symbol.clone(),
            close: self.kline.close,
            is_final: self.kline.is_closed,
            open: self.kline.open,
            high: self.kline.high,
            low: self.kline.low,
            time: self.kline.open_time,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BinanceApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_kline_rows() {
        let body: serde_json::Value = serde_json::from_str(
            r#"[
                [1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
                 "148976.11427815", 1499644799999, "2434.19055334", 308, "1756.87402397",
                 "28.46694368", "0"],
                ["bad"],
                [1499040060000, "1.0", "2.0", "0.5", "1.5", "10", 1499040119999]
            ]"#,
        )
        .unwrap();
        let candles = parse_klines(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, 1_499_040_000_000);
        assert!((candles[0].close - 0.015771).abs() < 1e-12);
        assert!((candles[1].high - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_array_klines_body_is_error() {
        let body: serde_json::Value =
            serde_json::from_str(r#"{"code": -1121, "msg": "Invalid symbol."}"#).unwrap();
        assert!(parse_klines(&body).is_err());
    }

    #[test]
    fn parses_ws_kline_event() {
        let text = r#"{
            "e": "kline", "E": 1672515782136, "s": "BNBBTC",
            "k": {
                "t": 1672515780000, "T": 1672515839999, "s": "BNBBTC", "i": "1m",
                "f": 100, "L": 200, "o": "0.0010", "c": "0.0020", "h": "0.0025",
                "l": "0.0015", "v": "1000", "n": 100, "x": false, "q": "1.0000",
                "V": "500", "Q": "0.500", "B": "123456"
            }
        }"#;
        let event: BinanceKlineEvent = serde_json::from_str(text).unwrap();
        assert_eq!(event.event_type, "kline");
        let tick = event.to_tick();
        assert_eq!(tick.symbol, "BNBBTC");
        assert!(!tick.is_final);
        assert_eq!(tick.time, 1_672_515_780_000);
        assert!((tick.close - 0.002).abs() < f64::EPSILON);
        assert!((tick.low - 0.0015).abs() < f64::EPSILON);
    }
}
