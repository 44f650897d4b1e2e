use axum::{
    body,
    http::{self, Request, StatusCode},
};
use bson::doc;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{create_test_profile, json_body, setup};
use crate::error::RankingError;
use crate::models::ranking::ExamMetadata;
use crate::month::MonthKey;

fn exam(exam_id: &str) -> ExamMetadata {
    ExamMetadata {
        exam_id: exam_id.to_string(),
        total_correct: 8,
        total_questions: 10,
        category: "Sinais".to_string(),
        passed: true,
    }
}

#[tokio::test]
async fn test_add_points_accumulates_points_and_exams() {
    let ctx = setup().await;
    create_test_profile(&ctx.db, "u1", "Ana", "Macamo").await;

    let first = ctx
        .services
        .ranking_service
        .add_points("u1", 10, Some(exam("e1")))
        .await
        .expect("first add_points failed");
    assert_eq!(first.points, 10);
    assert_eq!(first.exams, 1);
    assert_eq!(first.name, "Ana Macamo");
    assert_eq!(first.photo, "u1.jpg");

    let second = ctx
        .services
        .ranking_service
        .add_points("u1", 5, Some(exam("e2")))
        .await
        .expect("second add_points failed");
    assert_eq!(second.points, 15);
    assert_eq!(second.exams, 2);

    let history_count = ctx
        .db
        .collection::<bson::Document>("user_exam_history")
        .count_documents(doc! { "user_id": "u1" })
        .await
        .unwrap();
    assert_eq!(history_count, 2);
}

#[tokio::test]
async fn test_add_points_rejects_non_positive_deltas() {
    let ctx = setup().await;
    create_test_profile(&ctx.db, "u1", "Ana", "Macamo").await;

    for delta in [0, -5] {
        let err = ctx
            .services
            .ranking_service
            .add_points("u1", delta, None)
            .await
            .expect_err("non-positive delta must be rejected");
        assert!(matches!(err, RankingError::InvalidInput(_)));
    }

    let err = ctx
        .services
        .ranking_service
        .add_points("", 10, None)
        .await
        .expect_err("empty user id must be rejected");
    assert!(matches!(err, RankingError::InvalidInput(_)));

    // No record may have been created by the rejected calls.
    let record = ctx
        .services
        .ranking_service
        .store()
        .get_record(&MonthKey::current(), "u1")
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_add_points_without_profile_still_accrues() {
    let ctx = setup().await;

    let record = ctx
        .services
        .ranking_service
        .add_points("ghost", 7, None)
        .await
        .expect("missing profile must not block accrual");
    assert_eq!(record.points, 7);
    assert_eq!(record.name, "");
    assert_eq!(record.photo, "");

    // The entry is still served, with raw ranking fields only.
    let ranking = ctx.services.ranking_service.current_ranking(10).await.unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].uid, "ghost");
    assert_eq!(ranking[0].ranking_points, 7);
    assert_eq!(ranking[0].apelido, "");
}

#[tokio::test]
async fn test_current_ranking_orders_and_positions() {
    let ctx = setup().await;
    for (uid, points) in [("u_a", 30), ("u_b", 10), ("u_c", 20)] {
        create_test_profile(&ctx.db, uid, uid, "Test").await;
        ctx.services
            .ranking_service
            .add_points(uid, points, None)
            .await
            .unwrap();
    }

    let ranking = ctx.services.ranking_service.current_ranking(10).await.unwrap();
    let order: Vec<(&str, i64, Option<i64>)> = ranking
        .iter()
        .map(|e| (e.uid.as_str(), e.ranking_points, e.ranking_position))
        .collect();
    assert_eq!(
        order,
        vec![
            ("u_a", 30, Some(1)),
            ("u_c", 20, Some(2)),
            ("u_b", 10, Some(3)),
        ]
    );

    let truncated = ctx.services.ranking_service.current_ranking(2).await.unwrap();
    assert_eq!(truncated.len(), 2);
}

#[tokio::test]
async fn test_current_ranking_breaks_ties_by_user_id() {
    let ctx = setup().await;
    for uid in ["u_z", "u_a"] {
        ctx.services.ranking_service.add_points(uid, 25, None).await.unwrap();
    }

    let ranking = ctx.services.ranking_service.current_ranking(10).await.unwrap();
    let uids: Vec<&str> = ranking.iter().map(|e| e.uid.as_str()).collect();
    assert_eq!(uids, vec!["u_a", "u_z"]);
}

#[tokio::test]
async fn test_ranking_user_count_excludes_zero_points() {
    let ctx = setup().await;
    ctx.services.ranking_service.add_points("u1", 10, None).await.unwrap();
    ctx.services.ranking_service.add_points("u2", 20, None).await.unwrap();

    // A record that never accrued points must not be counted.
    let month = MonthKey::current();
    ctx.db
        .collection::<bson::Document>("monthly_ranking")
        .insert_one(doc! {
            "_id": format!("{}:u_zero", month),
            "uid": "u_zero",
            "name": "",
            "photo": "",
            "points": 0_i64,
            "exams": 0_i64,
            "month": month.to_string(),
            "created_at": bson::to_bson(&chrono::Utc::now()).unwrap(),
            "updated_at": bson::to_bson(&chrono::Utc::now()).unwrap(),
        })
        .await
        .unwrap();

    let count = ctx.services.ranking_service.ranking_user_count().await.unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_all_ranking_users_keeps_unenriched_records() {
    let ctx = setup().await;
    create_test_profile(&ctx.db, "u1", "Ana", "Macamo").await;
    ctx.services.ranking_service.add_points("u1", 10, None).await.unwrap();
    ctx.services.ranking_service.add_points("orphan", 5, None).await.unwrap();

    let users = ctx.services.ranking_service.all_ranking_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.ranking_position.is_none()));
    let orphan = users.iter().find(|u| u.uid == "orphan").unwrap();
    assert_eq!(orphan.ranking_points, 5);
}

#[tokio::test]
async fn test_set_ranking_attributes_partial_merge() {
    let ctx = setup().await;
    create_test_profile(&ctx.db, "u1", "Ana", "Macamo").await;

    let updated = ctx
        .services
        .profile_service
        .set_ranking_attributes("u1", Some(500), Some(3), None)
        .await
        .unwrap();
    assert_eq!(updated.ranking_points, Some(500));
    assert_eq!(updated.ranking_level, Some(3));
    assert_eq!(updated.awarded, None);
    // Untouched profile fields survive the merge.
    assert_eq!(updated.name, "Ana");

    let err = ctx
        .services
        .profile_service
        .set_ranking_attributes("u1", None, None, None)
        .await
        .expect_err("empty update must be rejected");
    assert!(matches!(err, RankingError::InvalidInput(_)));
}

#[tokio::test]
async fn test_add_points_endpoint() {
    let ctx = setup().await;
    create_test_profile(&ctx.db, "u9", "Rui", "Sitoe").await;

    let request = Request::builder()
        .uri("/ranking/points")
        .method("POST")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(json_body(&json!({
            "userId": "u9",
            "points": 10,
            "exam": {
                "examId": "e1",
                "totalCorrect": 8,
                "totalQuestions": 10,
                "category": "Sinais",
                "passed": true
            }
        })))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let record: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(record["points"], 10);
    assert_eq!(record["exams"], 1);

    // Non-positive deltas are rejected before any write.
    let request = Request::builder()
        .uri("/ranking/points")
        .method("POST")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(json_body(&json!({ "userId": "u9", "points": 0 })))
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ranking_read_endpoints() {
    let ctx = setup().await;
    create_test_profile(&ctx.db, "u1", "Ana", "Macamo").await;
    ctx.services.ranking_service.add_points("u1", 12, None).await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/ranking?limit=5").body(body::Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let ranking: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(ranking[0]["uid"], "u1");
    assert_eq!(ranking[0]["ranking_position"], 1);
    assert_eq!(ranking[0]["name"], "Ana");

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/ranking/count").body(body::Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let count: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(count["total_ranking_users"], 1);
}
