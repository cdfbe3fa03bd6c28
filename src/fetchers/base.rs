use crate::errors::Result;
use crate::models::stock::DailyRecord;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Base trait for daily market data fetchers
#[async_trait]
pub trait DailyDataFetcher {
    /// Get the provider code this fetcher is for
    fn provider_code(&self) -> &'static str;

    /// Fetch daily history for a symbol, from the start date through the present
    /// Returns one record per trading day reported by the provider
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: &NaiveDate,
    ) -> Result<Vec<DailyRecord>>;
}
