// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public certificate verification routes.
//!
//! No authentication is required. A valid session, if present, is recorded
//! as the verifier identity; otherwise the caller is logged as "public".

use crate::error::Result;
use crate::middleware::auth::optional_user;
use crate::middleware::security::no_store;
use crate::services::{Caller, VerificationResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    middleware,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify/{certificate_id}", get(verify_by_id))
        .route("/verify/code/{verification_code}", get(verify_by_code))
        .route_layer(middleware::from_fn(no_store))
}

/// Client address as reported by the fronting proxy.
pub fn source_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn caller(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> Caller {
    let source = source_address(headers);
    match optional_user(jar, headers, &state.config.jwt_signing_key) {
        Some(user) => Caller {
            identity: user.user_id,
            source_address: source,
        },
        None => Caller::public(source),
    }
}

async fn verify_by_id(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(certificate_id): Path<String>,
) -> Result<Json<VerificationResult>> {
    let caller = caller(&state, &jar, &headers);
    Ok(Json(
        state.verifier.verify_by_id(&certificate_id, &caller).await?,
    ))
}

async fn verify_by_code(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<VerificationResult>> {
    let caller = caller(&state, &jar, &headers);
    Ok(Json(state.verifier.verify_by_code(&code, &caller).await?))
}
