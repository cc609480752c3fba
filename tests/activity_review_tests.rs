// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity submission and review lifecycle tests.

use axum::http::{header, StatusCode};
use certportal::models::{ActivityStatus, Role};
use tower::ServiceExt;

mod common;
use common::{authed, create_test_app, json_body, multipart_body, read_json, seed_users};

#[tokio::test]
async fn test_multipart_submission_creates_pending_activity() {
    let app = create_test_app();
    seed_users(&app.state).await;

    let (content_type, body) = multipart_body(
        &[
            ("title", "Hackathon Win"),
            ("category", "technical"),
            ("level", "National"),
            ("organizing_body", "IEEE"),
            ("event_date", "2025-11-20"),
            ("technical_skills", "Python, Rust"),
            ("soft_skills", "Teamwork"),
            ("tools", "Git"),
        ],
        Some(("winner photo.jpg", b"\xff\xd8\xff")),
    );

    let response = app
        .router
        .clone()
        .oneshot(
            authed("POST", "/api/activities", &app.state, "stu-1", Role::Student)
                .header(header::CONTENT_TYPE, content_type)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let activity = read_json(response).await;
    assert_eq!(activity["status"], "pending");
    assert_eq!(activity["student_id"], "stu-1");
    assert_eq!(activity["level"], "National");

    // Proof stored under the upload dir, prefixed by the activity ID.
    let proof = activity["proof_documents"][0].as_str().unwrap();
    assert!(proof.ends_with("_winner_photo.jpg"));
    assert_eq!(std::fs::read(proof).unwrap(), b"\xff\xd8\xff");

    // Skills counted at submission time.
    let skills = app
        .state
        .db
        .get_student_skills("stu-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(skills.technical_frequency("python"), 1);
    assert_eq!(skills.overall_score, 10 * 2 + 8 + 6);
}

#[tokio::test]
async fn test_submission_validation_errors() {
    let app = create_test_app();

    let long_title = "x".repeat(201);
    for fields in [
        vec![("title", "No category")],
        vec![("title", ""), ("category", "sports")],
        vec![("title", long_title.as_str()), ("category", "sports")],
        vec![("title", "Bad level"), ("category", "sports"), ("level", "galactic")],
    ] {
        let (content_type, body) = multipart_body(&fields, None);
        let response = app
            .router
            .clone()
            .oneshot(
                authed("POST", "/api/activities", &app.state, "stu-1", Role::Student)
                    .header(header::CONTENT_TYPE, content_type)
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", fields);
    }

    assert!(app.state.db.all_activities().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_students_submit() {
    let app = create_test_app();
    let (content_type, body) = multipart_body(&[("title", "x"), ("category", "other")], None);

    let response = app
        .router
        .oneshot(
            authed("POST", "/api/activities", &app.state, "fac-1", Role::Faculty)
                .header(header::CONTENT_TYPE, content_type)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approve_with_comment() {
    let app = create_test_app();
    let activity = app
        .state
        .activities
        .submit("stu-1", common::new_activity("Hackathon Win"), None)
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            authed(
                "POST",
                &format!("/api/activities/{}/approve", activity.id),
                &app.state,
                "fac-1",
                Role::Faculty,
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body(serde_json::json!({ "comment": "Great work" })))
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["review_comment"], "Great work");
    assert_eq!(body["reviewed_by"], "fac-1");
}

#[tokio::test]
async fn test_approve_without_body() {
    let app = create_test_app();
    let activity = app
        .state
        .activities
        .submit("stu-1", common::new_activity("Quiz"), None)
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(
            authed(
                "POST",
                &format!("/api/activities/{}/approve", activity.id),
                &app.state,
                "adm-1",
                Role::Admin,
            )
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let app = create_test_app();
    let activity = app
        .state
        .activities
        .submit("stu-1", common::new_activity("Quiz"), None)
        .await
        .unwrap();

    let err = app
        .state
        .activities
        .reject(&activity.id, "fac-1", "   ")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let rejected = app
        .state
        .activities
        .reject(&activity.id, "fac-1", "No proof attached")
        .await
        .unwrap();
    assert_eq!(rejected.status, ActivityStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("No proof attached"));
}

#[tokio::test]
async fn test_transitions_are_monotonic() {
    let app = create_test_app();
    let activity = app
        .state
        .activities
        .submit("stu-1", common::new_activity("Quiz"), None)
        .await
        .unwrap();
    app.state
        .activities
        .reject(&activity.id, "fac-1", "Duplicate")
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(
            authed(
                "POST",
                &format!("/api/activities/{}/approve", activity.id),
                &app.state,
                "fac-1",
                Role::Faculty,
            )
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["error"], "invalid_transition");

    let stored = app
        .state
        .db
        .get_activity(&activity.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ActivityStatus::Rejected);
}

#[tokio::test]
async fn test_review_unknown_activity_is_not_found() {
    let app = create_test_app();
    let err = app
        .state
        .activities
        .approve("ACT_missing", "fac-1", None)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listings() {
    let app = create_test_app();
    let first = app
        .state
        .activities
        .submit("stu-1", common::new_activity("First"), None)
        .await
        .unwrap();
    app.state
        .activities
        .submit("stu-1", common::new_activity("Second"), None)
        .await
        .unwrap();
    app.state
        .activities
        .submit("stu-2", common::new_activity("Other student"), None)
        .await
        .unwrap();
    app.state
        .activities
        .approve(&first.id, "fac-1", None)
        .await
        .unwrap();

    // Own listing only shows the caller's activities.
    let response = app
        .router
        .clone()
        .oneshot(
            authed("GET", "/api/activities", &app.state, "stu-1", Role::Student)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let own = read_json(response).await;
    assert_eq!(own.as_array().unwrap().len(), 2);

    // Pending queue excludes the approved one.
    let pending = app.state.activities.pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|a| a.status == ActivityStatus::Pending));

    // Admin filter by status.
    let response = app
        .router
        .clone()
        .oneshot(
            authed(
                "GET",
                "/api/activities/all?status=approved",
                &app.state,
                "adm-1",
                Role::Admin,
            )
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    let approved = read_json(response).await;
    assert_eq!(approved.as_array().unwrap().len(), 1);
    assert_eq!(approved[0]["id"], first.id.as_str());

    let response = app
        .router
        .oneshot(
            authed(
                "GET",
                "/api/activities/all?status=bogus",
                &app.state,
                "adm-1",
                Role::Admin,
            )
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_skill_frequency_is_monotonic_across_submissions() {
    let app = create_test_app();

    let mut last = 0;
    for i in 0..3 {
        app.state
            .activities
            .submit("stu-1", common::new_activity(&format!("Event {}", i)), None)
            .await
            .unwrap();
        let skills = app
            .state
            .db
            .get_student_skills("stu-1")
            .await
            .unwrap()
            .unwrap();
        let freq = skills.technical_frequency("Python");
        assert!(freq > last);
        last = freq;
        // Same three distinct tags every time.
        assert_eq!(skills.overall_score, 10 + 8 + 6);
    }
}
