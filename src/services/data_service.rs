use crate::config;
use crate::errors::Result;
use crate::fetchers::base::DailyDataFetcher;
use crate::store::mongo::MongoWriter;
use chrono::NaiveDate;
use log::info;
use std::sync::Arc;

/// 数据服务，组织单次抓取并入库的周期
pub struct DataService {
    symbol: String,
    fetcher: Arc<dyn DailyDataFetcher + Send + Sync>,
    writer: MongoWriter,
}

impl DataService {
    /// 创建新的数据服务实例
    pub fn new(
        symbol: &str,
        fetcher: Arc<dyn DailyDataFetcher + Send + Sync>,
        writer: MongoWriter,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            fetcher,
            writer,
        }
    }

    /// 解析抓取起始日期，未指定时从固定起点开始
    pub fn resolve_start_date(start: Option<NaiveDate>) -> NaiveDate {
        start.unwrap_or_else(config::default_start_date)
    }

    /// 执行一次周期：抓取起始日期以来的日线数据并写入存储
    pub async fn run_cycle(&self, start: Option<NaiveDate>) -> Result<usize> {
        let start_date = Self::resolve_start_date(start);
        info!(
            "Processing {} via {} since {}",
            self.symbol,
            self.fetcher.provider_code(),
            start_date
        );

        let records = self
            .fetcher
            .fetch_daily_history(&self.symbol, &start_date)
            .await?;
        info!("Fetched {} records for {}", records.len(), self.symbol);

        self.writer.persist(&records).await
    }
}
