use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::user::UserProfile;
use crate::month::MonthKey;

/// Per-user record inside a month partition of the `monthly_ranking`
/// collection. The document `_id` is `"{month}:{uid}"`, which enforces the
/// one-record-per-(month, user) invariant at the store level.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankingRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub uid: String,
    pub name: String,
    pub photo: String,
    pub points: i64,
    pub exams: i64,
    #[schema(value_type = String)]
    pub month: MonthKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RankingRecord {
    pub fn record_id(month: &MonthKey, uid: &str) -> String {
        format!("{}:{}", month, uid)
    }
}

/// Exam-completion metadata handed in by the exam subsystem alongside a
/// point delta.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamMetadata {
    pub exam_id: String,
    #[serde(default)]
    pub total_correct: i64,
    #[serde(default)]
    pub total_questions: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub passed: bool,
}

/// Append-only audit row, one per exam-completion event. Never read back by
/// the ranking computation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamHistoryEntry {
    pub user_id: String,
    pub exam_id: String,
    pub points_earned: i64,
    pub total_correct: i64,
    pub total_questions: i64,
    pub category: String,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub month: MonthKey,
}

/// A leaderboard entry: monthly ranking fields merged with the user's full
/// profile. Profile fields fall back to the record's denormalized values (or
/// empty) when the profile lookup fails, so a missing profile never drops an
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankedUser {
    pub uid: String,
    pub name: String,
    pub apelido: String,
    pub telefone: String,
    pub provincia: String,
    pub gender: String,
    #[serde(rename = "birthYear")]
    pub birth_year: String,
    pub email: String,
    pub photo: String,
    #[serde(rename = "isPro")]
    pub is_pro: bool,
    #[serde(rename = "acceptedRanking")]
    pub accepted_ranking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking_position: Option<i64>,
    pub ranking_points: i64,
    pub ranking_exams_count: i64,
}

impl RankedUser {
    /// Merge a ranking record with the profile lookup outcome. `position` is
    /// `None` for unordered reads.
    pub fn hydrate(
        record: RankingRecord,
        profile: Option<UserProfile>,
        position: Option<i64>,
    ) -> Self {
        match profile {
            Some(p) => Self {
                uid: record.uid,
                name: p.name,
                apelido: p.apelido,
                telefone: p.telefone,
                provincia: p.provincia,
                gender: p.gender,
                birth_year: p.birth_year,
                email: p.email,
                photo: record.photo,
                is_pro: p.is_pro,
                accepted_ranking: p.accepted_ranking,
                ranking_position: position,
                ranking_points: record.points,
                ranking_exams_count: record.exams,
            },
            None => Self {
                uid: record.uid,
                name: record.name,
                apelido: String::new(),
                telefone: String::new(),
                provincia: String::new(),
                gender: String::new(),
                birth_year: String::new(),
                email: String::new(),
                photo: record.photo,
                is_pro: false,
                accepted_ranking: false,
                ranking_position: position,
                ranking_points: record.points,
                ranking_exams_count: record.exams,
            },
        }
    }
}

/// Entry of the previous month's top-10, exposed with a `position` field
/// (the winners read path predates the `ranking_position` naming and keeps
/// its own shape).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreviousWinner {
    pub uid: String,
    pub name: String,
    pub apelido: String,
    pub telefone: String,
    pub provincia: String,
    pub photo: String,
    pub position: i64,
    pub ranking_points: i64,
}

impl PreviousWinner {
    pub fn hydrate(record: RankingRecord, profile: Option<UserProfile>, position: i64) -> Self {
        let (name, apelido, telefone, provincia) = match profile {
            Some(p) => (p.name, p.apelido, p.telefone, p.provincia),
            None => (record.name.clone(), String::new(), String::new(), String::new()),
        };
        Self {
            uid: record.uid,
            name,
            apelido,
            telefone,
            provincia,
            photo: record.photo,
            position,
            ranking_points: record.points,
        }
    }
}

/// Immutable point-in-time copy of a month's leaderboard. Keyed by month so
/// a re-run of the archival job cannot produce a second snapshot for the
/// same window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankingSnapshot {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub month: MonthKey,
    pub captured_at: DateTime<Utc>,
    pub top_100: Vec<RankedUser>,
}

/// Top-10 leaderboard entry persisted separately for award processing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankingWinner {
    pub user_id: String,
    pub user_name: String,
    pub user_photo: String,
    pub points: i64,
    pub position: i64,
    #[schema(value_type = String)]
    pub month: MonthKey,
    pub awarded_at: DateTime<Utc>,
}
