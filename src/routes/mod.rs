use axum::{routing::get, Router};
use mongodb::Database;
use std::sync::Arc;

use crate::services::{
    profile_service::ProfileService, ranking_service::RankingService,
    snapshot_service::SnapshotService,
};

pub mod ranking;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
pub async fn health_check() -> &'static str {
    "OK"
}

pub fn init_routes(db: Arc<Database>) -> Router {
    let profile_service = Arc::new(ProfileService::new(db.clone()));
    let ranking_service = Arc::new(RankingService::new(db.clone(), profile_service.clone()));
    let snapshot_service = Arc::new(SnapshotService::new(db.clone()));

    Router::new()
        .route("/health", get(health_check))
        .merge(ranking::ranking_routes(
            ranking_service,
            snapshot_service,
            profile_service,
        ))
}
