use crate::errors::{Result, TrackerError};
use crate::fetchers::base::DailyDataFetcher;
use crate::models::stock::DailyRecord;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// chart 接口响应结构，在抓取边界直接映射为固定形状
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
    events: Option<ChartEvents>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    // 交易所相对UTC的秒偏移，用于把时间戳还原成交易日
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

/// Yahoo Finance 日线数据抓取器
pub struct YahooFetcher {
    client: Client,
}

impl YahooFetcher {
    /// 创建新的抓取器
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(TrackerError::RequestError)?;

        Ok(Self { client })
    }

    /// 将时间戳按交易所偏移换算为交易日
    fn trade_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
    }

    /// 将 chart 结果映射为日线记录，缺失必要字段的行跳过
    fn records_from_chart(result: &ChartResult) -> Vec<DailyRecord> {
        let timestamps = match &result.timestamp {
            Some(timestamps) => timestamps,
            None => return Vec::new(),
        };
        let quote = match result.indicators.quote.first() {
            Some(quote) => quote,
            None => return Vec::new(),
        };
        let gmtoffset = result.meta.gmtoffset;

        // 分红与拆股事件按交易日索引
        let mut dividends: HashMap<String, f64> = HashMap::new();
        let mut splits: HashMap<String, f64> = HashMap::new();
        if let Some(events) = &result.events {
            for event in events.dividends.values() {
                if let Some(date) = Self::trade_date(event.date, gmtoffset) {
                    dividends.insert(date.format("%Y-%m-%d").to_string(), event.amount);
                }
            }
            for event in events.splits.values() {
                if event.denominator == 0.0 {
                    warn!("跳过分母为零的拆股事件: {:?}", event);
                    continue;
                }
                if let Some(date) = Self::trade_date(event.date, gmtoffset) {
                    splits.insert(
                        date.format("%Y-%m-%d").to_string(),
                        event.numerator / event.denominator,
                    );
                }
            }
        }

        let mut records = Vec::new();
        for (i, &timestamp) in timestamps.iter().enumerate() {
            let date = match Self::trade_date(timestamp, gmtoffset) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => {
                    warn!("跳过无法解析的时间戳: {}", timestamp);
                    continue;
                }
            };

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            match (open, high, low, close, volume) {
                (Some(open), Some(high), Some(low), Some(close), Some(volume)) => {
                    records.push(DailyRecord {
                        dividends: dividends.get(&date).copied().unwrap_or(0.0),
                        stock_splits: splits.get(&date).copied().unwrap_or(0.0),
                        date,
                        open,
                        high,
                        low,
                        close,
                        volume,
                    });
                }
                _ => {
                    warn!("跳过行情字段缺失的交易日: {}", date);
                }
            }
        }

        // 按交易日升序排列
        records.sort_by(|a, b| a.date.cmp(&b.date));
        records
    }
}

#[async_trait]
impl DailyDataFetcher for YahooFetcher {
    fn provider_code(&self) -> &'static str {
        "YAHOO"
    }

    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: &NaiveDate,
    ) -> Result<Vec<DailyRecord>> {
        let period1 = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let period2 = Utc::now().timestamp();
        info!("获取 {} 自 {} 以来的日线数据", symbol, start);

        let response = self
            .client
            .get(format!("{}/{}", CHART_URL, symbol))
            .query(&[
                ("period1", period1.to_string().as_str()),
                ("period2", period2.to_string().as_str()),
                ("interval", "1d"),
                ("events", "div|split"),
            ])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(TrackerError::RequestError)?
            .error_for_status()?;

        let envelope = response.json::<ChartResponse>().await?;
        debug!("成功获取响应");

        if let Some(error) = envelope.chart.error {
            return Err(TrackerError::ProviderError(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let result = envelope
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| {
                TrackerError::DataError(format!("empty chart result for {}", symbol))
            })?;

        let records = Self::records_from_chart(&result);
        debug!("获取到 {} 条日线记录", records.len());

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "TSLA", "gmtoffset": -18000},
                "timestamp": [1709303400, 1709562600, 1709649000],
                "indicators": {
                    "quote": [{
                        "open":   [180.0, 185.5, null],
                        "high":   [182.0, 188.0, 190.0],
                        "low":    [179.5, 184.2, 187.0],
                        "close":  [181.2, 187.3, 189.1],
                        "volume": [1000000, 1200000, 900000]
                    }]
                },
                "events": {
                    "dividends": {
                        "1709562600": {"amount": 0.25, "date": 1709562600}
                    },
                    "splits": {
                        "1709303400": {"date": 1709303400, "numerator": 3.0, "denominator": 1.0, "splitRatio": "3:1"}
                    }
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_rows_map_to_daily_records() {
        let envelope: ChartResponse = serde_json::from_str(SAMPLE_CHART).unwrap();
        let result = &envelope.chart.result.unwrap()[0];
        let records = YahooFetcher::records_from_chart(result);

        // 第三行 open 缺失，应当被丢弃
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].date, "2024-03-01");
        assert_eq!(records[0].open, 180.0);
        assert_eq!(records[0].high, 182.0);
        assert_eq!(records[0].low, 179.5);
        assert_eq!(records[0].close, 181.2);
        assert_eq!(records[0].volume, 1_000_000);
        assert_eq!(records[0].dividends, 0.0);
        assert_eq!(records[0].stock_splits, 3.0);

        assert_eq!(records[1].date, "2024-03-04");
        assert_eq!(records[1].dividends, 0.25);
        assert_eq!(records[1].stock_splits, 0.0);
    }

    #[test]
    fn records_are_sorted_by_trade_date() {
        let mut envelope: ChartResponse = serde_json::from_str(SAMPLE_CHART).unwrap();
        // 打乱时间戳顺序，输出仍按交易日升序
        let result = &mut envelope.chart.result.as_mut().unwrap()[0];
        result.timestamp.as_mut().unwrap().swap(0, 1);
        if let Some(quote) = result.indicators.quote.first_mut() {
            quote.open.swap(0, 1);
            quote.high.swap(0, 1);
            quote.low.swap(0, 1);
            quote.close.swap(0, 1);
            quote.volume.swap(0, 1);
        }

        let records = YahooFetcher::records_from_chart(result);
        assert_eq!(records[0].date, "2024-03-01");
        assert_eq!(records[1].date, "2024-03-04");
    }

    #[test]
    fn missing_timestamps_yield_no_records() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": 0},
                    "indicators": {"quote": [{}]}
                }],
                "error": null
            }
        }"#;
        let envelope: ChartResponse = serde_json::from_str(json).unwrap();
        let result = &envelope.chart.result.unwrap()[0];
        assert!(YahooFetcher::records_from_chart(result).is_empty());
    }

    #[test]
    fn provider_error_payload_deserializes() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;
        let envelope: ChartResponse = serde_json::from_str(json).unwrap();
        let error = envelope.chart.error.unwrap();
        assert_eq!(error.code, "Not Found");
    }

    #[test]
    fn trade_date_applies_exchange_offset() {
        // 2024-03-01 14:30 UTC，交易所偏移 -5 小时，应落在 2024-03-01
        let date = YahooFetcher::trade_date(1709303400, -18000).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
