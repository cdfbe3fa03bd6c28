use crate::config::Config;
use crate::errors::Result;
use crate::models::stock::{group_records_by_year, DailyRecord};
use log::{debug, info};
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::UpdateOptions;
use mongodb::{Client, Collection};

/// MongoDB 写入器，把日线数据合并进按年份分片的文档
pub struct MongoWriter {
    uri: String,
    db_name: String,
    collection_name: String,
}

impl MongoWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            uri: config.mongo_uri.clone(),
            db_name: config.db_name.clone(),
            collection_name: config.collection_name.clone(),
        }
    }

    /// upsert 匹配条件：按年份定位文档
    fn upsert_filter(year: i32) -> Document {
        doc! { "year": year }
    }

    /// upsert 更新内容：写入 data.<date> 字段，已存在则覆盖
    fn upsert_update(record: &DailyRecord) -> Result<Document> {
        let value = to_bson(record)?;
        Ok(doc! { "$set": { format!("data.{}", record.date): value } })
    }

    /// 将一批日线数据写入存储，返回写入条数
    ///
    /// 每个日期的写入各自幂等，失败后整体重试是安全的。
    /// 连接在每个周期内建立并随写入器释放，不跨周期持有。
    pub async fn persist(&self, records: &[DailyRecord]) -> Result<usize> {
        if records.is_empty() {
            info!("No records to store");
            return Ok(0);
        }

        let client = Client::with_uri_str(&self.uri).await?;
        let collection: Collection<Document> = client
            .database(&self.db_name)
            .collection(&self.collection_name);

        let options = UpdateOptions::builder().upsert(true).build();
        let mut written = 0;

        for (year, group) in group_records_by_year(records)? {
            debug!("Writing {} records into year document {}", group.len(), year);
            for record in &group {
                collection
                    .update_one(
                        Self::upsert_filter(year),
                        Self::upsert_update(record)?,
                        options.clone(),
                    )
                    .await?;
                written += 1;
            }
        }

        info!("Stored {} records in MongoDB", written);
        Ok(written)
    }
}
