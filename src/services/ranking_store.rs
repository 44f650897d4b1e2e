use std::sync::Arc;

use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{options::ReturnDocument, Collection, Database};

use crate::error::RankingError;
use crate::models::ranking::RankingRecord;
use crate::month::MonthKey;

/// Store of per-user ranking records, partitioned by calendar month.
///
/// A partition is the set of documents sharing a `month` value; it comes
/// into existence with its first record and is never deleted. Increments go
/// through `$inc` on the server so concurrent contributions for the same
/// user serialize without lost updates.
pub struct MonthlyRankingStore {
    collection: Collection<RankingRecord>,
}

impl MonthlyRankingStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            collection: db.collection("monthly_ranking"),
        }
    }

    pub async fn get_record(
        &self,
        month: &MonthKey,
        uid: &str,
    ) -> Result<Option<RankingRecord>, RankingError> {
        let record = self
            .collection
            .find_one(doc! { "_id": RankingRecord::record_id(month, uid) })
            .await?;
        Ok(record)
    }

    /// Inserts a freshly created record. Fails with a duplicate-key store
    /// error if a record for the same (month, user) already exists; the
    /// caller falls back to the increment path in that case.
    pub async fn put_record(&self, record: &RankingRecord) -> Result<(), RankingError> {
        self.collection.insert_one(record).await?;
        Ok(())
    }

    /// Atomic add-in-place of point and exam-count deltas. Returns the
    /// post-update record, or `None` when no record exists for the user in
    /// that month.
    pub async fn increment_record(
        &self,
        month: &MonthKey,
        uid: &str,
        points_delta: i64,
        exams_delta: i64,
    ) -> Result<Option<RankingRecord>, RankingError> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": RankingRecord::record_id(month, uid) },
                doc! {
                    "$inc": { "points": points_delta, "exams": exams_delta },
                    "$set": { "updated_at": bson::to_bson(&Utc::now())? },
                },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    /// All records in a month partition, in no particular order.
    pub async fn list_records(
        &self,
        month: &MonthKey,
    ) -> Result<Vec<RankingRecord>, RankingError> {
        let cursor = self
            .collection
            .find(doc! { "month": month.to_string() })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Top records of a month partition, points descending. Ties break on
    /// ascending user id so repeated reads return the same order.
    pub async fn top_by_points(
        &self,
        month: &MonthKey,
        limit: i64,
    ) -> Result<Vec<RankingRecord>, RankingError> {
        let cursor = self
            .collection
            .find(doc! { "month": month.to_string() })
            .sort(doc! { "points": -1, "uid": 1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Number of records in the partition with more points than `floor`.
    pub async fn count_with_points_over(
        &self,
        month: &MonthKey,
        floor: i64,
    ) -> Result<u64, RankingError> {
        let count = self
            .collection
            .count_documents(doc! {
                "month": month.to_string(),
                "points": { "$gt": floor },
            })
            .await?;
        Ok(count)
    }
}
