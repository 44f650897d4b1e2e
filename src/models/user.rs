use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user document from the profile store (`users` collection).
///
/// Profile documents were written by several client versions and may carry
/// extra keys; those are ignored on deserialization, and every field listed
/// here defaults when absent so reads never fail on a sparse document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub apelido: String,
    pub gender: String,
    #[serde(rename = "birthYear")]
    pub birth_year: String,
    pub provincia: String,
    pub telefone: String,
    pub email: String,
    pub image: String,
    #[serde(rename = "isPro")]
    pub is_pro: bool,
    #[serde(rename = "acceptedRanking")]
    pub accepted_ranking: bool,
    // Month-agnostic ranking attributes, maintained only through the
    // administrative override path. Distinct from the monthly records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awarded: Option<bool>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Display name as denormalized into ranking records: "name apelido",
    /// trimmed when either half is missing.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.apelido).trim().to_string()
    }
}
