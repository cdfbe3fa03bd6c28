use crate::errors::{Result, TrackerError};
use chrono::NaiveDate;
use std::env;

/// 跟踪的股票代码
pub const INSTRUMENT_SYMBOL: &str = "TSLA";

/// 历史数据抓取的固定起始日期
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// 环境变量配置
#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub db_name: String,
    pub collection_name: String,
}

impl Config {
    /// 从环境变量加载配置，MONGO_URI 为必填项
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            env::var("MONGO_URI").ok(),
            env::var("DB_NAME").ok(),
            env::var("COLLECTION_NAME").ok(),
        )
    }

    fn resolve(
        mongo_uri: Option<String>,
        db_name: Option<String>,
        collection_name: Option<String>,
    ) -> Result<Self> {
        let mongo_uri = mongo_uri
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| TrackerError::ConfigError("MONGO_URI not set".to_string()))?;

        Ok(Self {
            mongo_uri,
            db_name: db_name.unwrap_or_else(|| "test".to_string()),
            collection_name: collection_name.unwrap_or_else(|| "tesla_stock".to_string()),
        })
    }
}
