use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::routes::init_routes;

mod config;
mod db;
mod error;
mod models;
mod month;
mod routes;
mod services;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health_check,
        routes::ranking::get_current_ranking,
        routes::ranking::get_previous_month_winners,
        routes::ranking::get_all_ranking_users,
        routes::ranking::get_ranking_user_count,
        routes::ranking::add_points,
        routes::ranking::capture_snapshot,
        routes::ranking::set_ranking_attributes,
    ),
    components(
        schemas(
            models::ranking::RankingRecord,
            models::ranking::ExamMetadata,
            models::ranking::RankedUser,
            models::ranking::PreviousWinner,
            models::ranking::RankingSnapshot,
            models::ranking::RankingWinner,
            models::user::UserProfile,
            routes::ranking::AddPointsRequest,
            routes::ranking::SetRankingAttributesRequest,
            routes::ranking::RankingCountResponse,
        ),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let db = Arc::new(db::init_db(&config.mongodb_uri).await);

    let app = Router::new()
        .merge(init_routes(db))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind port");
    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
