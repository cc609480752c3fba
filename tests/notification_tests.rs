// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Certificate email delivery tests.

use axum::body::Body;
use axum::http::StatusCode;
use certportal::config::Config;
use certportal::db::RecordStore;
use certportal::models::{Certificate, EmailStatus, Role};
use certportal::services::{MailService, PdfRenderer};
use certportal::AppState;
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{approved_activity, authed, create_test_app, read_json, seed_users, test_user};

async fn issued(state: &AppState) -> Certificate {
    let activity = approved_activity(state, "Hackathon Win").await;
    state.issuer.issue(&activity.id, "adm-1").await.unwrap()
}

#[tokio::test]
async fn test_email_sent_and_recorded() {
    let app = create_test_app();
    seed_users(&app.state).await;
    let cert = issued(&app.state).await;

    let response = app
        .router
        .clone()
        .oneshot(
            authed(
                "POST",
                &format!("/api/certificates/{}/email", cert.id),
                &app.state,
                "adm-1",
                Role::Admin,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "sent");
    assert_eq!(body["recipient"], "stu-1@example.edu");
    assert!(body["message_id"].is_string());

    let after = app.state.db.get_certificate(&cert.id).await.unwrap().unwrap();
    assert_eq!(after.email_status, EmailStatus::Sent);
    assert_eq!(after.email_history.len(), 1);
}

#[tokio::test]
async fn test_missing_recipient_not_recorded() {
    let app = create_test_app();
    seed_users(&app.state).await;
    let mut student = test_user("stu-1", "Asha Rao", Role::Student);
    student.email = None;
    app.state.db.upsert_user(&student).await.unwrap();
    let cert = issued(&app.state).await;

    let err = app
        .state
        .dispatcher
        .send_certificate(&cert.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let after = app.state.db.get_certificate(&cert.id).await.unwrap().unwrap();
    assert_eq!(after.email_status, EmailStatus::NotSent);
    assert!(after.email_history.is_empty());
}

#[tokio::test]
async fn test_missing_artifact_recorded_as_failed() {
    let app = create_test_app();
    seed_users(&app.state).await;
    let cert = issued(&app.state).await;
    std::fs::remove_file(&cert.artifact_path).unwrap();

    let err = app
        .state
        .dispatcher
        .send_certificate(&cert.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    let after = app.state.db.get_certificate(&cert.id).await.unwrap().unwrap();
    assert_eq!(after.email_status, EmailStatus::Failed);
    assert_eq!(after.email_history.len(), 1);
    assert!(after.email_history[0].error.is_some());
}

#[tokio::test]
async fn test_provider_failure_recorded_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::test_default();
    config.certificate_dir = dir.path().join("certificates");
    config.upload_dir = dir.path().join("uploads");
    // Nothing listens on the discard port.
    config.mail_api_url = "http://127.0.0.1:9/v3/smtp/email".to_string();
    config.mail_api_key = Some("test-key".to_string());
    config.mail_timeout_secs = 2;

    let mail = MailService::new(&config).unwrap();
    let state = Arc::new(AppState::new(
        config,
        RecordStore::new_in_memory(),
        PdfRenderer::new_mock(),
        mail,
    ));
    seed_users(&state).await;
    let cert = issued(&state).await;

    let err = state.dispatcher.send_certificate(&cert.id).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

    let after = state.db.get_certificate(&cert.id).await.unwrap().unwrap();
    assert_eq!(after.email_status, EmailStatus::Failed);
    assert_eq!(after.email_history.len(), 1);
    assert_eq!(after.email_history[0].recipient, "stu-1@example.edu");
}

#[tokio::test]
async fn test_unconfigured_provider_recorded_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::test_default();
    config.certificate_dir = dir.path().join("certificates");
    config.upload_dir = dir.path().join("uploads");
    config.mail_api_key = None;

    let mail = MailService::new(&config).unwrap();
    let state = Arc::new(AppState::new(
        config,
        RecordStore::new_in_memory(),
        PdfRenderer::new_mock(),
        mail,
    ));
    seed_users(&state).await;
    let cert = issued(&state).await;

    let err = state.dispatcher.send_certificate(&cert.id).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

    let after = state.db.get_certificate(&cert.id).await.unwrap().unwrap();
    assert_eq!(after.email_status, EmailStatus::Failed);
    assert!(after.email_history[0]
        .error
        .as_deref()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn test_retry_after_failure_appends_history() {
    let app = create_test_app();
    seed_users(&app.state).await;
    let cert = issued(&app.state).await;

    let pdf = std::fs::read(&cert.artifact_path).unwrap();
    std::fs::remove_file(&cert.artifact_path).unwrap();
    assert!(app.state.dispatcher.send_certificate(&cert.id).await.is_err());

    std::fs::write(&cert.artifact_path, pdf).unwrap();
    app.state.dispatcher.send_certificate(&cert.id).await.unwrap();

    let after = app.state.db.get_certificate(&cert.id).await.unwrap().unwrap();
    assert_eq!(after.email_status, EmailStatus::Sent);
    let statuses: Vec<_> = after.email_history.iter().map(|a| a.status).collect();
    assert_eq!(statuses, vec![EmailStatus::Failed, EmailStatus::Sent]);
}

#[tokio::test]
async fn test_email_unknown_certificate() {
    let app = create_test_app();
    let err = app
        .state
        .dispatcher
        .send_certificate("CERT_0_MISSING")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}
