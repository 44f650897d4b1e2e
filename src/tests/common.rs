use axum::{body::Body, Router};
use chrono::Utc;
use mongodb::Database;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    db::init_db,
    models::user::UserProfile,
    routes,
    services::{
        profile_service::ProfileService, ranking_service::RankingService,
        snapshot_service::SnapshotService,
    },
};

pub struct TestServices {
    pub ranking_service: Arc<RankingService>,
    pub snapshot_service: Arc<SnapshotService>,
    pub profile_service: Arc<ProfileService>,
}

pub struct TestContext {
    pub app: Router,
    pub db: Arc<Database>,
    pub services: TestServices,
    // Tests share one database; held for the whole test so collection drops
    // in one test cannot race another.
    _guard: MutexGuard<'static, ()>,
}

static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub async fn setup() -> TestContext {
    dotenv::dotenv().ok();
    let guard = DB_LOCK.lock().await;

    let uri = std::env::var("MONGODB_TEST_URI").expect("MONGODB_TEST_URI must be set for tests");
    let db = Arc::new(init_db(&uri).await);

    for collection in [
        "users",
        "monthly_ranking",
        "user_exam_history",
        "ranking_history",
        "ranking_winners",
    ] {
        db.collection::<bson::Document>(collection)
            .drop()
            .await
            .unwrap_or_else(|e| panic!("Failed to drop collection {}: {}", collection, e));
    }

    let profile_service = Arc::new(ProfileService::new(db.clone()));
    let ranking_service = Arc::new(RankingService::new(db.clone(), profile_service.clone()));
    let snapshot_service = Arc::new(SnapshotService::new(db.clone()));

    let app = routes::init_routes(db.clone());

    TestContext {
        app,
        db,
        services: TestServices {
            ranking_service,
            snapshot_service,
            profile_service,
        },
        _guard: guard,
    }
}

/// Inserts a profile document the ranking engine can hydrate from.
pub async fn create_test_profile(db: &Arc<Database>, uid: &str, name: &str, apelido: &str) {
    let profile = UserProfile {
        id: uid.to_string(),
        name: name.to_string(),
        apelido: apelido.to_string(),
        gender: "M".to_string(),
        birth_year: "1995".to_string(),
        provincia: "Maputo".to_string(),
        telefone: "841234567".to_string(),
        email: format!("{}@example.com", uid),
        image: format!("{}.jpg", uid),
        accepted_ranking: true,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
        ..Default::default()
    };

    db.collection("users")
        .insert_one(profile)
        .await
        .expect("Failed to insert test profile");
}

/// Helper to create a JSON body for requests.
pub fn json_body(json: &Value) -> Body {
    Body::from(json.to_string())
}
