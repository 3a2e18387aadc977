//! REST market data - historical candles and order book depth.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::types::{DepthSnapshot, Kline, PriceLevel, Symbol};

pub struct MarketDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl MarketDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch up to `limit` OHLCV rows for a symbol/interval. Rows that do
    /// not parse are skipped.
    pub async fn fetch_klines(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Kline>> {
        let url = format!(
            "{}/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );
        let rows = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await?;

        let klines: Vec<Kline> = rows.iter().filter_map(kline_from_row).collect();
        debug!(symbol = %symbol, interval, count = klines.len(), "fetched klines");
        Ok(klines)
    }

    /// Fetch the order book for a symbol, truncated to `limit` levels per
    /// side.
    pub async fn fetch_depth(&self, symbol: &Symbol, limit: usize) -> Result<DepthSnapshot> {
        let url = format!(
            "{}/v3/depth?symbol={}&limit={}",
            self.base_url, symbol, limit
        );
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Ok(depth_from_value(&body, limit))
    }
}

/// Map one exchange kline row (a heterogeneous JSON array) to a candle,
/// normalizing open time from milliseconds to seconds.
pub(crate) fn kline_from_row(row: &Value) -> Option<Kline> {
    let fields = row.as_array()?;
    Some(Kline {
        time: fields.first()?.as_i64()? / 1000,
        open: decimal_field(fields.get(1)?)?,
        high: decimal_field(fields.get(2)?)?,
        low: decimal_field(fields.get(3)?)?,
        close: decimal_field(fields.get(4)?)?,
        volume: decimal_field(fields.get(5)?)?,
    })
}

pub(crate) fn depth_from_value(body: &Value, limit: usize) -> DepthSnapshot {
    let side = |key: &str| -> Vec<PriceLevel> {
        body[key]
            .as_array()
            .map(|levels| {
                levels
                    .iter()
                    .take(limit)
                    .filter_map(level_from_row)
                    .collect()
            })
            .unwrap_or_default()
    };
    DepthSnapshot {
        bids: side("bids"),
        asks: side("asks"),
    }
}

fn level_from_row(row: &Value) -> Option<PriceLevel> {
    let fields = row.as_array()?;
    Some(PriceLevel {
        price: decimal_field(fields.first()?)?,
        amount: decimal_field(fields.get(1)?)?,
    })
}

fn decimal_field(value: &Value) -> Option<Decimal> {
    value.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_kline_row_normalizes_time_to_seconds() {
        let row = json!([
            1_700_000_000_000_i64,
            "50000.0",
            "50500.0",
            "49800.0",
            "50200.0",
            "123.45",
            1_700_000_059_999_i64,
            "6190000.0",
            100,
            "60.0",
            "3010000.0",
            "0"
        ]);
        let kline = kline_from_row(&row).unwrap();
        assert_eq!(kline.time, 1_700_000_000);
        assert_eq!(kline.open, d("50000.0"));
        assert_eq!(kline.high, d("50500.0"));
        assert_eq!(kline.low, d("49800.0"));
        assert_eq!(kline.close, d("50200.0"));
        assert_eq!(kline.volume, d("123.45"));
    }

    #[test]
    fn test_malformed_kline_row_skipped() {
        assert!(kline_from_row(&json!(["nope"])).is_none());
        assert!(kline_from_row(&json!({"time": 1})).is_none());
        assert!(kline_from_row(&json!([1_700_000_000_000_i64, "x", "1", "1", "1", "1"])).is_none());
    }

    #[test]
    fn test_depth_truncates_to_limit() {
        let body = json!({
            "lastUpdateId": 1,
            "bids": [["100.0", "1.0"], ["99.5", "2.0"], ["99.0", "3.0"]],
            "asks": [["100.5", "1.5"], ["101.0", "2.5"], ["101.5", "3.5"]]
        });
        let depth = depth_from_value(&body, 2);
        assert_eq!(depth.bids.len(), 2);
        assert_eq!(depth.asks.len(), 2);
        assert_eq!(
            depth.bids[0],
            PriceLevel {
                price: d("100.0"),
                amount: d("1.0")
            }
        );
        assert_eq!(
            depth.asks[1],
            PriceLevel {
                price: d("101.0"),
                amount: d("2.5")
            }
        );
    }

    #[test]
    fn test_depth_with_missing_sides_is_empty() {
        let depth = depth_from_value(&json!({}), 20);
        assert!(depth.bids.is_empty());
        assert!(depth.asks.is_empty());
    }
}
