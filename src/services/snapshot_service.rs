use std::sync::Arc;

use bson::doc;
use chrono::Utc;
use mongodb::{Collection, Database};
use tracing::info;

use crate::error::{is_duplicate_key, RankingError};
use crate::models::ranking::{RankingSnapshot, RankingWinner};
use crate::month::MonthKey;
use crate::services::ranking_service::RankingService;

/// End-of-month archival: freezes the leaderboard into `ranking_history`
/// and records the top 10 in `ranking_winners`.
pub struct SnapshotService {
    snapshots: Collection<RankingSnapshot>,
    winners: Collection<RankingWinner>,
}

impl SnapshotService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            snapshots: db.collection("ranking_history"),
            winners: db.collection("ranking_winners"),
        }
    }

    /// Captures the current month's top 100 as an immutable snapshot and the
    /// leading 10 entries as winner records.
    ///
    /// The snapshot document is keyed by month, so a re-run within the same
    /// month returns the already-captured snapshot and writes nothing.
    pub async fn capture_snapshot(
        &self,
        ranking: &RankingService,
    ) -> Result<RankingSnapshot, RankingError> {
        let month = MonthKey::current();
        let top_100 = ranking.current_ranking(100).await?;

        let snapshot = RankingSnapshot {
            month,
            captured_at: Utc::now(),
            top_100,
        };

        match self.snapshots.insert_one(&snapshot).await {
            Ok(_) => {}
            Err(err) if is_duplicate_key(&err) => {
                info!(month = %month, "ranking snapshot already captured, skipping");
                return self
                    .snapshots
                    .find_one(doc! { "_id": month.to_string() })
                    .await?
                    .ok_or_else(|| RankingError::NotFound(format!("snapshot for {}", month)));
            }
            Err(err) => return Err(err.into()),
        }

        let awarded_at = Utc::now();
        let winners: Vec<RankingWinner> = snapshot
            .top_100
            .iter()
            .take(10)
            .enumerate()
            .map(|(i, entry)| RankingWinner {
                user_id: entry.uid.clone(),
                user_name: entry.name.clone(),
                user_photo: entry.photo.clone(),
                points: entry.ranking_points,
                position: i as i64 + 1,
                month,
                awarded_at,
            })
            .collect();

        if !winners.is_empty() {
            self.winners.insert_many(&winners).await?;
        }

        Ok(snapshot)
    }
}
