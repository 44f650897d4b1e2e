use std::sync::Arc;

use chrono::Utc;
use mongodb::{Collection, Database};
use tracing::warn;

use crate::error::{is_duplicate_key, RankingError};
use crate::models::ranking::{
    ExamHistoryEntry, ExamMetadata, PreviousWinner, RankedUser, RankingRecord,
};
use crate::models::user::UserProfile;
use crate::month::MonthKey;
use crate::services::profile_service::ProfileService;
use crate::services::ranking_store::MonthlyRankingStore;

/// Point aggregation and leaderboard reads over the monthly ranking store.
pub struct RankingService {
    store: MonthlyRankingStore,
    history: Collection<ExamHistoryEntry>,
    profiles: Arc<ProfileService>,
}

impl RankingService {
    pub fn new(db: Arc<Database>, profiles: Arc<ProfileService>) -> Self {
        Self {
            store: MonthlyRankingStore::new(db.clone()),
            history: db.collection("user_exam_history"),
            profiles,
        }
    }

    pub fn store(&self) -> &MonthlyRankingStore {
        &self.store
    }

    /// Credits an exam completion to the user's current-month record,
    /// creating the record on first contribution. When metadata is supplied,
    /// an exam-history row is appended regardless of which path ran.
    ///
    /// Retrying a successful call double-counts; deduplication of the
    /// triggering event is the caller's responsibility.
    pub async fn add_points(
        &self,
        uid: &str,
        points_delta: i64,
        exam: Option<ExamMetadata>,
    ) -> Result<RankingRecord, RankingError> {
        if uid.is_empty() {
            return Err(RankingError::InvalidInput("user id is required".to_string()));
        }
        if points_delta <= 0 {
            return Err(RankingError::InvalidInput(format!(
                "points delta must be positive, got {}",
                points_delta
            )));
        }

        let month = MonthKey::current();
        let record = match self.store.increment_record(&month, uid, points_delta, 1).await? {
            Some(record) => record,
            None => self.create_record(&month, uid, points_delta).await?,
        };

        if let Some(exam) = exam {
            self.history
                .insert_one(ExamHistoryEntry {
                    user_id: uid.to_string(),
                    exam_id: exam.exam_id,
                    points_earned: points_delta,
                    total_correct: exam.total_correct,
                    total_questions: exam.total_questions,
                    category: exam.category,
                    passed: exam.passed,
                    completed_at: Utc::now(),
                    month,
                })
                .await?;
        }

        Ok(record)
    }

    /// First contribution of the month for this user: snapshot name/photo
    /// from the profile (best-effort) and insert the record. A concurrent
    /// first contribution may win the insert; the loser falls back to the
    /// increment path so neither delta is dropped.
    async fn create_record(
        &self,
        month: &MonthKey,
        uid: &str,
        points_delta: i64,
    ) -> Result<RankingRecord, RankingError> {
        let profile = self.lookup_profile(uid).await;
        let (name, photo) = profile
            .map(|p| (p.display_name(), p.image))
            .unwrap_or_default();

        let now = Utc::now();
        let record = RankingRecord {
            id: RankingRecord::record_id(month, uid),
            uid: uid.to_string(),
            name,
            photo,
            points: points_delta,
            exams: 1,
            month: *month,
            created_at: now,
            updated_at: now,
        };

        match self.store.put_record(&record).await {
            Ok(()) => Ok(record),
            Err(RankingError::Store(err)) if is_duplicate_key(&err) => self
                .store
                .increment_record(month, uid, points_delta, 1)
                .await?
                .ok_or_else(|| RankingError::NotFound(format!("ranking record for {}", uid))),
            Err(err) => Err(err),
        }
    }

    /// Current month's leaderboard: points descending, 1-based positions,
    /// each entry hydrated with the full profile where one exists.
    pub async fn current_ranking(&self, limit: i64) -> Result<Vec<RankedUser>, RankingError> {
        let month = MonthKey::current();
        let records = self.store.top_by_points(&month, limit).await?;

        let mut ranking = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let profile = self.lookup_profile(&record.uid).await;
            ranking.push(RankedUser::hydrate(record, profile, Some(i as i64 + 1)));
        }
        Ok(ranking)
    }

    /// Top 10 of the previous month's partition. In January this reads
    /// December of the prior year.
    pub async fn previous_month_winners(&self) -> Result<Vec<PreviousWinner>, RankingError> {
        let month = MonthKey::current().previous();
        let records = self.store.top_by_points(&month, 10).await?;

        let mut winners = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let profile = self.lookup_profile(&record.uid).await;
            winners.push(PreviousWinner::hydrate(record, profile, i as i64 + 1));
        }
        Ok(winners)
    }

    /// Every record in the current month, unordered. A failed profile
    /// lookup keeps the entry with its raw ranking fields.
    pub async fn all_ranking_users(&self) -> Result<Vec<RankedUser>, RankingError> {
        let month = MonthKey::current();
        let records = self.store.list_records(&month).await?;

        let mut users = Vec::with_capacity(records.len());
        for record in records {
            let profile = self.lookup_profile(&record.uid).await;
            users.push(RankedUser::hydrate(record, profile, None));
        }
        Ok(users)
    }

    /// Number of current-month records that have accrued any points.
    pub async fn ranking_user_count(&self) -> Result<u64, RankingError> {
        self.store
            .count_with_points_over(&MonthKey::current(), 0)
            .await
    }

    /// Best-effort profile lookup. Missing profiles and store failures both
    /// degrade to `None`; ranking reads and accrual must not be blocked by
    /// a stale or missing profile.
    async fn lookup_profile(&self, uid: &str) -> Option<UserProfile> {
        match self.profiles.get_profile(uid).await {
            Ok(profile) => Some(profile),
            Err(RankingError::NotFound(_)) => None,
            Err(err) => {
                warn!(uid, error = %err, "profile lookup failed, continuing without profile");
                None
            }
        }
    }
}
