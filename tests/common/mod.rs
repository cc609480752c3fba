// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use certportal::config::Config;
use certportal::db::RecordStore;
use certportal::models::{Activity, Role, User};
use certportal::routes::create_router;
use certportal::services::{MailService, NewActivity, PdfRenderer};
use certportal::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_db() -> RecordStore {
    RecordStore::connect_firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app over the in-memory store with mock renderer and mail.
///
/// Artifacts go to a temp dir that lives as long as this value.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub dir: TempDir,
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(|_| {})
}

#[allow(dead_code)]
pub fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::test_default();
    config.certificate_dir = dir.path().join("certificates");
    config.upload_dir = dir.path().join("uploads");
    configure(&mut config);

    let state = Arc::new(AppState::new(
        config,
        RecordStore::new_in_memory(),
        PdfRenderer::new_mock(),
        MailService::new_mock(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        dir,
    }
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        role: Role,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn test_user(id: &str, name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: Some(format!("{}@example.edu", id)),
        role,
        password_hash: None,
        roll_number: (role == Role::Student).then(|| "21CS042".to_string()),
        department: Some("Computer Science".to_string()),
        employee_id: (role != Role::Student).then(|| "EMP-7".to_string()),
        created_at: chrono::Utc::now(),
    }
}

/// Seed one student, one faculty member and one admin.
#[allow(dead_code)]
pub async fn seed_users(state: &AppState) {
    for user in [
        test_user("stu-1", "Asha Rao", Role::Student),
        test_user("fac-1", "Dr. Menon", Role::Faculty),
        test_user("adm-1", "Registrar", Role::Admin),
    ] {
        state.db.upsert_user(&user).await.unwrap();
    }
}

#[allow(dead_code)]
pub fn new_activity(title: &str) -> NewActivity {
    NewActivity {
        title: title.to_string(),
        description: Some("First place among 120 teams".to_string()),
        category: certportal::models::ActivityCategory::Technical,
        event_date: chrono::NaiveDate::from_ymd_opt(2025, 11, 20),
        organizing_body: Some("IEEE".to_string()),
        level: Some(certportal::models::AchievementLevel::National),
        technical_skills: vec!["Python".to_string()],
        soft_skills: vec!["Teamwork".to_string()],
        tools: vec!["Git".to_string()],
    }
}

/// Submit and approve an activity for `stu-1`.
#[allow(dead_code)]
pub async fn approved_activity(state: &AppState, title: &str) -> Activity {
    let activity = state
        .activities
        .submit("stu-1", new_activity(title), None)
        .await
        .unwrap();
    state
        .activities
        .approve(&activity.id, "fac-1", Some("Great work".to_string()))
        .await
        .unwrap()
}

/// Authenticated request builder.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, state: &AppState, user_id: &str, role: Role) -> axum::http::request::Builder {
    let token = create_test_jwt(user_id, role, &state.config.jwt_signing_key);
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
}

#[allow(dead_code)]
pub fn json_body(value: serde_json::Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

#[allow(dead_code)]
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn read_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Encode text fields (and an optional file) as multipart/form-data.
#[allow(dead_code)]
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> (String, Body) {
    let boundary = "certportal-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"proof\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    (
        format!("multipart/form-data; boundary={}", boundary),
        Body::from(body),
    )
}
