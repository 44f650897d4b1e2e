use std::sync::Arc;

use bson::{doc, Document};
use chrono::Utc;
use mongodb::{options::ReturnDocument, Collection, Database};

use crate::error::RankingError;
use crate::models::user::UserProfile;

/// Read adapter over the `users` collection. The ranking engine only ever
/// reads profiles, except for the administrative ranking-attribute override.
pub struct ProfileService {
    collection: Collection<UserProfile>,
}

impl ProfileService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    pub async fn get_profile(&self, uid: &str) -> Result<UserProfile, RankingError> {
        self.collection
            .find_one(doc! { "_id": uid })
            .await?
            .ok_or_else(|| RankingError::NotFound(format!("user {}", uid)))
    }

    /// Partial merge of the month-agnostic ranking attributes onto a user
    /// document. Only the supplied fields are written; the document is
    /// created if it does not exist yet. Not part of the accrual flow.
    pub async fn set_ranking_attributes(
        &self,
        uid: &str,
        points: Option<i64>,
        level: Option<i32>,
        awarded: Option<bool>,
    ) -> Result<UserProfile, RankingError> {
        if uid.is_empty() {
            return Err(RankingError::InvalidInput("user id is required".to_string()));
        }
        if points.is_none() && level.is_none() && awarded.is_none() {
            return Err(RankingError::InvalidInput(
                "no ranking attributes to update".to_string(),
            ));
        }

        let mut fields = Document::new();
        if let Some(points) = points {
            fields.insert("ranking_points", points);
        }
        if let Some(level) = level {
            fields.insert("ranking_level", level);
        }
        if let Some(awarded) = awarded {
            fields.insert("awarded", awarded);
        }
        fields.insert("updatedAt", bson::to_bson(&Utc::now())?);

        self.collection
            .find_one_and_update(doc! { "_id": uid }, doc! { "$set": fields })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| RankingError::NotFound(format!("user {}", uid)))
    }
}
