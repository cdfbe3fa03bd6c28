use crate::errors::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个交易日的行情数据，date 格式为 YYYY-MM-DD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub dividends: f64,
    pub stock_splits: f64,
}

impl DailyRecord {
    /// 记录所属的年份
    pub fn year(&self) -> Result<i32> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")?;
        Ok(date.year())
    }
}

/// 按年聚合的存储文档，每个交易日一个条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearDocument {
    pub year: i32,
    pub data: BTreeMap<String, DailyRecord>,
}

impl YearDocument {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            data: BTreeMap::new(),
        }
    }

    /// 合并单日数据，同日期直接覆盖
    pub fn merge_record(&mut self, record: DailyRecord) {
        self.data.insert(record.date.clone(), record);
    }
}

/// 按年份拆分一批日线数据
pub fn group_records_by_year(records: &[DailyRecord]) -> Result<BTreeMap<i32, Vec<DailyRecord>>> {
    let mut groups: BTreeMap<i32, Vec<DailyRecord>> = BTreeMap::new();
    for record in records {
        let year = record.year()?;
        groups.entry(year).or_default().push(record.clone());
    }
    Ok(groups)
}
