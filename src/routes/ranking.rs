use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::RankingError;
use crate::models::ranking::{
    ExamMetadata, PreviousWinner, RankedUser, RankingRecord, RankingSnapshot,
};
use crate::models::user::UserProfile;
use crate::services::{
    profile_service::ProfileService, ranking_service::RankingService,
    snapshot_service::SnapshotService,
};

type RankingState = (Arc<RankingService>, Arc<SnapshotService>, Arc<ProfileService>);

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPointsRequest {
    pub user_id: String,
    pub points: i64,
    pub exam: Option<ExamMetadata>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetRankingAttributesRequest {
    pub points: Option<i64>,
    pub level: Option<i32>,
    pub awarded: Option<bool>,
}

#[derive(Deserialize)]
pub struct RankingQuery {
    limit: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct RankingCountResponse {
    pub total_ranking_users: u64,
}

#[utoipa::path(
    get,
    path = "/ranking",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of entries, default 50")
    ),
    responses(
        (status = 200, description = "Current month leaderboard", body = [RankedUser]),
    )
)]
pub async fn get_current_ranking(
    State((ranking_service, _snapshot_service, _profile_service)): State<RankingState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<RankedUser>>, RankingError> {
    let ranking = ranking_service
        .current_ranking(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(ranking))
}

#[utoipa::path(
    get,
    path = "/ranking/winners",
    responses(
        (status = 200, description = "Previous month's top 10", body = [PreviousWinner]),
    )
)]
pub async fn get_previous_month_winners(
    State((ranking_service, _snapshot_service, _profile_service)): State<RankingState>,
) -> Result<Json<Vec<PreviousWinner>>, RankingError> {
    let winners = ranking_service.previous_month_winners().await?;
    Ok(Json(winners))
}

#[utoipa::path(
    get,
    path = "/ranking/users",
    responses(
        (status = 200, description = "All current-month ranking users, unordered", body = [RankedUser]),
    )
)]
pub async fn get_all_ranking_users(
    State((ranking_service, _snapshot_service, _profile_service)): State<RankingState>,
) -> Result<Json<Vec<RankedUser>>, RankingError> {
    let users = ranking_service.all_ranking_users().await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/ranking/count",
    responses(
        (status = 200, description = "Number of users with points this month", body = RankingCountResponse),
    )
)]
pub async fn get_ranking_user_count(
    State((ranking_service, _snapshot_service, _profile_service)): State<RankingState>,
) -> Result<Json<RankingCountResponse>, RankingError> {
    let total_ranking_users = ranking_service.ranking_user_count().await?;
    Ok(Json(RankingCountResponse { total_ranking_users }))
}

#[utoipa::path(
    post,
    path = "/ranking/points",
    request_body = AddPointsRequest,
    responses(
        (status = 200, description = "Updated ranking record", body = RankingRecord),
        (status = 400, description = "Non-positive points or missing user id"),
    )
)]
pub async fn add_points(
    State((ranking_service, _snapshot_service, _profile_service)): State<RankingState>,
    Json(req): Json<AddPointsRequest>,
) -> Result<Json<RankingRecord>, RankingError> {
    let record = ranking_service
        .add_points(&req.user_id, req.points, req.exam)
        .await?;
    Ok(Json(record))
}

#[utoipa::path(
    post,
    path = "/ranking/snapshot",
    responses(
        (status = 201, description = "Captured (or previously captured) snapshot", body = RankingSnapshot),
    )
)]
pub async fn capture_snapshot(
    State((ranking_service, snapshot_service, _profile_service)): State<RankingState>,
) -> Result<(StatusCode, Json<RankingSnapshot>), RankingError> {
    let snapshot = snapshot_service.capture_snapshot(&ranking_service).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    patch,
    path = "/ranking/users/{id}/attributes",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = SetRankingAttributesRequest,
    responses(
        (status = 200, description = "Updated user document", body = UserProfile),
        (status = 400, description = "No attributes supplied"),
    )
)]
pub async fn set_ranking_attributes(
    State((_ranking_service, _snapshot_service, profile_service)): State<RankingState>,
    Path(id): Path<String>,
    Json(req): Json<SetRankingAttributesRequest>,
) -> Result<Json<UserProfile>, RankingError> {
    let profile = profile_service
        .set_ranking_attributes(&id, req.points, req.level, req.awarded)
        .await?;
    Ok(Json(profile))
}

pub fn ranking_routes(
    ranking_service: Arc<RankingService>,
    snapshot_service: Arc<SnapshotService>,
    profile_service: Arc<ProfileService>,
) -> Router {
    Router::new()
        .route("/ranking", axum::routing::get(get_current_ranking))
        .route("/ranking/winners", axum::routing::get(get_previous_month_winners))
        .route("/ranking/users", axum::routing::get(get_all_ranking_users))
        .route("/ranking/count", axum::routing::get(get_ranking_user_count))
        .route("/ranking/points", axum::routing::post(add_points))
        .route("/ranking/snapshot", axum::routing::post(capture_snapshot))
        .route(
            "/ranking/users/{id}/attributes",
            axum::routing::patch(set_ranking_attributes),
        )
        .with_state((ranking_service, snapshot_service, profile_service))
}
